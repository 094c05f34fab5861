//! Integration tests: synthesize the full stage and inspect the assembly.

use std::collections::BTreeSet;
use std::fs;

use serde_json::Value;
use tempfile::tempdir;

use bloginfra_stacks::stage::api_stage;
use bloginfra_stacks::InfraConfig;

fn synthesized() -> bloginfra_core::CloudAssembly {
    api_stage(&InfraConfig::default()).unwrap().synth().unwrap()
}

fn methods_of(template: &Value) -> Vec<(String, Value)> {
    template["Resources"]
        .as_object()
        .unwrap()
        .iter()
        .filter(|(_, entry)| entry["Type"] == "AWS::ApiGateway::Method")
        .map(|(id, entry)| (id.clone(), entry["Properties"].clone()))
        .collect()
}

/// The API stack's declared dependency set is exactly the three leaves.
#[test]
fn test_api_dependency_set() {
    let stage = api_stage(&InfraConfig::default()).unwrap();
    let deps = stage.dependencies_of("blog-api-prod").unwrap();
    let expected: BTreeSet<String> = [
        "blog-certificate-prod".to_string(),
        "blog-auth-prod".to_string(),
        "blog-data-prod".to_string(),
    ]
    .into();
    assert_eq!(deps, &expected);

    let order = stage.deploy_order().unwrap();
    assert_eq!(order.len(), 4);
    assert_eq!(order[3], "blog-api-prod");
}

/// The table has exactly one key attribute (`id`, string) and no secondary
/// indexes.
#[test]
fn test_table_shape() {
    let assembly = synthesized();
    let template = assembly.template("blog-data-prod").unwrap();
    let tables: Vec<&Value> = template["Resources"]
        .as_object()
        .unwrap()
        .values()
        .filter(|entry| entry["Type"] == "AWS::DynamoDB::Table")
        .collect();
    assert_eq!(tables.len(), 1);

    let props = &tables[0]["Properties"];
    assert_eq!(props["KeySchema"].as_array().unwrap().len(), 1);
    assert_eq!(props["KeySchema"][0]["AttributeName"], "id");
    assert_eq!(props["AttributeDefinitions"][0]["AttributeType"], "S");
    assert!(props.get("GlobalSecondaryIndexes").is_none());
    assert!(props.get("LocalSecondaryIndexes").is_none());
    assert_eq!(tables[0]["DeletionPolicy"], "Delete");
}

/// Every authorized route's scope matches its verb: GET requires
/// `blogapi.read`, the create POST requires `blogapi.write`, and the
/// auth-check route carries no authorizer.
#[test]
fn test_scopes_match_verbs() {
    let assembly = synthesized();
    let template = assembly.template("blog-api-prod").unwrap();

    for (id, props) in methods_of(template) {
        let verb = props["HttpMethod"].as_str().unwrap();
        match verb {
            "GET" => {
                assert_eq!(props["AuthorizationType"], "COGNITO_USER_POOLS", "{id}");
                assert_eq!(
                    props["AuthorizationScopes"][0],
                    "blogapi-resource-server/blogapi.read",
                    "{id}"
                );
            }
            "POST" if id.contains("Create") => {
                assert_eq!(
                    props["AuthorizationScopes"][0],
                    "blogapi-resource-server/blogapi.write",
                    "{id}"
                );
            }
            "POST" => {
                assert_eq!(props["AuthorizationType"], "NONE", "{id}");
            }
            "OPTIONS" => {}
            other => panic!("unexpected method {other} at {id}"),
        }
    }
}

/// The CORS responder is a mock returning 200 with the four fixed headers.
#[test]
fn test_cors_preflight() {
    let assembly = synthesized();
    let template = assembly.template("blog-api-prod").unwrap();

    let options: Vec<Value> = methods_of(template)
        .into_iter()
        .filter(|(_, props)| props["HttpMethod"] == "OPTIONS")
        .map(|(_, props)| props)
        .collect();
    assert_eq!(options.len(), 1);

    let integration = &options[0]["Integration"];
    assert_eq!(integration["Type"], "MOCK");
    let response = &integration["IntegrationResponses"][0];
    assert_eq!(response["StatusCode"], "200");

    let params = response["ResponseParameters"].as_object().unwrap();
    assert_eq!(params.len(), 4);
    assert_eq!(
        params["method.response.header.Access-Control-Allow-Origin"],
        "'*'"
    );
    assert_eq!(
        params["method.response.header.Access-Control-Allow-Methods"],
        "'OPTIONS,GET,POST'"
    );
    assert_eq!(
        params["method.response.header.Access-Control-Allow-Headers"],
        "'Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token'"
    );
    assert_eq!(
        params["method.response.header.Access-Control-Allow-Credentials"],
        "'false'"
    );
}

/// The DNS alias record's name equals the custom domain configured on the
/// API, and it targets that domain's distribution.
#[test]
fn test_alias_matches_custom_domain() {
    let assembly = synthesized();
    let template = assembly.template("blog-api-prod").unwrap();
    let resources = template["Resources"].as_object().unwrap();

    let domain = resources
        .values()
        .find(|entry| entry["Type"] == "AWS::ApiGateway::DomainName")
        .unwrap();
    let record = resources
        .values()
        .find(|entry| entry["Type"] == "AWS::Route53::RecordSet")
        .unwrap();

    let domain_name = domain["Properties"]["DomainName"].as_str().unwrap();
    assert_eq!(domain_name, "blogapi.example.com");
    assert_eq!(
        record["Properties"]["Name"].as_str().unwrap(),
        format!("{domain_name}.")
    );
    assert_eq!(
        record["Properties"]["AliasTarget"]["DNSName"]["Fn::GetAtt"][0],
        "BlogApiDomain"
    );
}

/// Each function's execution role carries exactly the grants its route
/// needs.
#[test]
fn test_least_privilege_grants() {
    let assembly = synthesized();
    let template = assembly.template("blog-api-prod").unwrap();
    let resources = template["Resources"].as_object().unwrap();

    let actions_for = |role: &str| -> Vec<String> {
        resources
            .values()
            .filter(|entry| {
                entry["Type"] == "AWS::IAM::Policy"
                    && entry["Properties"]["Roles"][0]["Ref"] == role
            })
            .flat_map(|entry| {
                entry["Properties"]["PolicyDocument"]["Statement"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .flat_map(|s| s["Action"].as_array().unwrap().clone())
                    .map(|a| a.as_str().unwrap().to_string())
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    let create = actions_for("CreatePostFunctionRole");
    assert!(create.contains(&"dynamodb:PutItem".to_string()));

    let list = actions_for("ListPostsFunctionRole");
    assert!(list.contains(&"dynamodb:Scan".to_string()));
    assert!(!list.contains(&"dynamodb:PutItem".to_string()));

    let get = actions_for("GetPostFunctionRole");
    assert!(get.contains(&"dynamodb:GetItem".to_string()));
    assert!(!get.contains(&"dynamodb:DeleteItem".to_string()));

    let auth = actions_for("AuthUserFunctionRole");
    assert!(auth.contains(&"ssm:GetParameter".to_string()));
    assert!(auth.contains(&"cognito-idp:AdminInitiateAuth".to_string()));
    assert!(!auth.iter().any(|a| a.starts_with("dynamodb:")));
}

/// Every cross-stack import made by the API stack resolves against an
/// export from one of its three dependencies.
#[test]
fn test_cross_stack_references_resolve() {
    let stage = api_stage(&InfraConfig::default()).unwrap();
    let api = stage.stack("blog-api-prod").unwrap();

    let mut exports: BTreeSet<String> = BTreeSet::new();
    for name in ["blog-certificate-prod", "blog-data-prod", "blog-auth-prod"] {
        exports.extend(stage.stack(name).unwrap().exports());
    }

    let imports = api.imports();
    assert!(!imports.is_empty());
    for import in imports {
        assert!(exports.contains(&import), "unresolved import {import}");
    }
}

/// Re-synthesizing the same configuration produces a byte-identical
/// assembly on disk.
#[test]
fn test_synthesis_is_deterministic() {
    let first_dir = tempdir().unwrap();
    let second_dir = tempdir().unwrap();

    synthesized().write_to(first_dir.path()).unwrap();
    synthesized().write_to(second_dir.path()).unwrap();

    let mut names: Vec<String> = fs::read_dir(first_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 5); // four templates plus the manifest

    for name in names {
        let first = fs::read(first_dir.path().join(&name)).unwrap();
        let second = fs::read(second_dir.path().join(&name)).unwrap();
        assert_eq!(first, second, "{name} differs between synth runs");
    }
}

/// Stage tags land on every taggable resource in every stack.
#[test]
fn test_stage_tags_propagate() {
    let assembly = synthesized();
    let template = assembly.template("blog-data-prod").unwrap();
    let table = template["Resources"]["PostsTable"]["Properties"].clone();
    let tags = table["Tags"].as_array().unwrap();
    assert!(tags.contains(&serde_json::json!({ "Key": "Project", "Value": "Blog" })));
    assert!(tags.contains(&serde_json::json!({ "Key": "Stage", "Value": "prod" })));
}
