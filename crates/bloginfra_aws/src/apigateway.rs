//! API Gateway REST API constructs: resource tree, methods, Cognito
//! authorizer, CORS preflight, deployment/stage, and custom domain.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::debug;

use bloginfra_core::intrinsics;
use bloginfra_core::{Resource, Stack, SynthError, SynthResult};

use crate::lambda::FunctionHandle;
use crate::route53::AliasTarget;

/// REST API configuration. Endpoints are edge-optimized, matching the
/// original topology.
#[derive(Debug, Clone)]
pub struct RestApiProps {
    pub rest_api_name: String,
}

/// How a method forwards requests.
pub enum Integration<'a> {
    /// Proxy integration to a Lambda function.
    Lambda(&'a FunctionHandle),
}

/// Method-level authorization.
#[derive(Debug, Clone)]
pub enum Authorization {
    /// Open route; the handler performs its own checks if any.
    None,
    /// Cognito user-pool authorizer, optionally requiring OAuth scopes.
    Cognito {
        authorizer_id: Value,
        scopes: Vec<String>,
    },
}

/// The four fixed header values returned by the CORS preflight responder.
/// A deliberate simplification with no origin restriction, not a security
/// boundary.
pub struct CorsPreflight;

impl CorsPreflight {
    pub const ALLOW_HEADERS: &'static str =
        "'Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token'";
    pub const ALLOW_METHODS: &'static str = "'OPTIONS,GET,POST'";
    pub const ALLOW_ORIGIN: &'static str = "'*'";
    pub const ALLOW_CREDENTIALS: &'static str = "'false'";

    fn response_parameters() -> Map<String, Value> {
        let mut params = Map::new();
        params.insert(
            "method.response.header.Access-Control-Allow-Credentials".to_string(),
            json!(Self::ALLOW_CREDENTIALS),
        );
        params.insert(
            "method.response.header.Access-Control-Allow-Headers".to_string(),
            json!(Self::ALLOW_HEADERS),
        );
        params.insert(
            "method.response.header.Access-Control-Allow-Methods".to_string(),
            json!(Self::ALLOW_METHODS),
        );
        params.insert(
            "method.response.header.Access-Control-Allow-Origin".to_string(),
            json!(Self::ALLOW_ORIGIN),
        );
        params
    }
}

/// A REST API under construction: tracks the resource tree by path and the
/// declared methods so the deployment can depend on all of them.
pub struct RestApi {
    logical_id: String,
    resource_ids: BTreeMap<String, Value>,
    method_ids: Vec<String>,
}

impl RestApi {
    pub fn new(stack: &mut Stack, id: &str, props: RestApiProps) -> SynthResult<Self> {
        let resource = Resource::new("AWS::ApiGateway::RestApi")
            .prop("Name", json!(props.rest_api_name))
            .prop("EndpointConfiguration", json!({ "Types": ["EDGE"] }));
        let logical_id = stack.add_resource(id, resource)?;
        debug!(api = %props.rest_api_name, %logical_id, "declared rest api");

        let mut resource_ids = BTreeMap::new();
        resource_ids.insert(
            "/".to_string(),
            intrinsics::get_att(&logical_id, "RootResourceId"),
        );

        Ok(Self {
            logical_id,
            resource_ids,
            method_ids: Vec::new(),
        })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn api_ref(&self) -> Value {
        intrinsics::r#ref(&self.logical_id)
    }

    fn resource_id(&self, path: &str) -> SynthResult<Value> {
        self.resource_ids.get(path).cloned().ok_or_else(|| {
            SynthError::InvalidConfiguration(format!("no API resource declared at path `{path}`"))
        })
    }

    /// Add a child resource under `parent_path` and return the new path.
    pub fn add_resource(
        &mut self,
        stack: &mut Stack,
        parent_path: &str,
        path_part: &str,
    ) -> SynthResult<String> {
        let parent_id = self.resource_id(parent_path)?;
        let path = if parent_path == "/" {
            format!("/{path_part}")
        } else {
            format!("{parent_path}/{path_part}")
        };

        let logical_id = stack.add_resource(
            &format!("{}{}Resource", self.logical_id, path_title(&path)),
            Resource::new("AWS::ApiGateway::Resource")
                .prop("RestApiId", self.api_ref())
                .prop("ParentId", parent_id)
                .prop("PathPart", json!(path_part)),
        )?;
        self.resource_ids
            .insert(path.clone(), intrinsics::r#ref(&logical_id));
        Ok(path)
    }

    /// Bind one HTTP method at `path` to an integration, gated by `auth`.
    pub fn add_method(
        &mut self,
        stack: &mut Stack,
        path: &str,
        http_method: &str,
        integration: Integration<'_>,
        auth: Authorization,
    ) -> SynthResult<String> {
        let resource_id = self.resource_id(path)?;

        let integration_value = match &integration {
            Integration::Lambda(function) => json!({
                "Type": "AWS_PROXY",
                "IntegrationHttpMethod": "POST",
                "Uri": intrinsics::sub(&format!(
                    "arn:aws:apigateway:${{AWS::Region}}:lambda:path/2015-03-31/functions/${{{}.Arn}}/invocations",
                    function.logical_id()
                )),
            }),
        };

        let mut resource = Resource::new("AWS::ApiGateway::Method")
            .prop("RestApiId", self.api_ref())
            .prop("ResourceId", resource_id)
            .prop("HttpMethod", json!(http_method))
            .prop("Integration", integration_value);

        resource = match &auth {
            Authorization::None => resource.prop("AuthorizationType", json!("NONE")),
            Authorization::Cognito {
                authorizer_id,
                scopes,
            } => resource
                .prop("AuthorizationType", json!("COGNITO_USER_POOLS"))
                .prop("AuthorizerId", authorizer_id.clone())
                .prop_opt(
                    "AuthorizationScopes",
                    if scopes.is_empty() {
                        None
                    } else {
                        Some(json!(scopes))
                    },
                ),
        };

        let logical_id = stack.add_resource(
            &format!("{}{}{}Method", self.logical_id, path_title(path), http_method),
            resource,
        )?;

        if let Integration::Lambda(function) = integration {
            function.grant_invoke_from_api(stack, &self.logical_id)?;
        }

        self.method_ids.push(logical_id.clone());
        Ok(logical_id)
    }

    /// Attach the CORS preflight responder at `path`: a mock OPTIONS method
    /// returning a static 200 with the four fixed headers.
    pub fn add_cors_preflight(&mut self, stack: &mut Stack, path: &str) -> SynthResult<String> {
        let resource_id = self.resource_id(path)?;
        let response_parameters = CorsPreflight::response_parameters();

        let mut method_response_parameters = Map::new();
        for header in response_parameters.keys() {
            method_response_parameters.insert(header.clone(), json!(true));
        }

        let resource = Resource::new("AWS::ApiGateway::Method")
            .prop("RestApiId", self.api_ref())
            .prop("ResourceId", resource_id)
            .prop("HttpMethod", json!("OPTIONS"))
            .prop("AuthorizationType", json!("NONE"))
            .prop(
                "Integration",
                json!({
                    "Type": "MOCK",
                    "RequestTemplates": { "application/json": "{\"statusCode\": 200}" },
                    "IntegrationResponses": [{
                        "StatusCode": "200",
                        "ResponseParameters": response_parameters,
                    }],
                }),
            )
            .prop(
                "MethodResponses",
                json!([{
                    "StatusCode": "200",
                    "ResponseParameters": method_response_parameters,
                }]),
            );

        let logical_id = stack.add_resource(
            &format!("{}{}OPTIONSMethod", self.logical_id, path_title(path)),
            resource,
        )?;
        self.method_ids.push(logical_id.clone());
        Ok(logical_id)
    }

    /// Declare the deployment and a named stage over it. The deployment
    /// depends on every method declared so far, so call this last.
    pub fn deploy(&self, stack: &mut Stack, stage_name: &str) -> SynthResult<String> {
        let mut deployment = Resource::new("AWS::ApiGateway::Deployment")
            .prop("RestApiId", self.api_ref());
        for method_id in &self.method_ids {
            deployment = deployment.depends_on(method_id.clone());
        }
        let deployment_id = stack.add_resource(&format!("{}Deployment", self.logical_id), deployment)?;

        stack.add_resource(
            &format!("{}Stage", self.logical_id),
            Resource::new("AWS::ApiGateway::Stage")
                .prop("RestApiId", self.api_ref())
                .prop("DeploymentId", intrinsics::r#ref(&deployment_id))
                .prop("StageName", json!(stage_name)),
        )
    }
}

/// Cognito user-pool authorizer attached to a REST API.
pub struct CognitoAuthorizer {
    logical_id: String,
}

impl CognitoAuthorizer {
    pub fn new(
        stack: &mut Stack,
        id: &str,
        api: &RestApi,
        name: &str,
        provider_arns: Vec<Value>,
    ) -> SynthResult<Self> {
        let resource = Resource::new("AWS::ApiGateway::Authorizer")
            .prop("Name", json!(name))
            .prop("Type", json!("COGNITO_USER_POOLS"))
            .prop("IdentitySource", json!("method.request.header.Authorization"))
            .prop("RestApiId", api.api_ref())
            .prop("ProviderARNs", Value::Array(provider_arns));
        let logical_id = stack.add_resource(id, resource)?;
        Ok(Self { logical_id })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn authorizer_ref(&self) -> Value {
        intrinsics::r#ref(&self.logical_id)
    }
}

/// Custom domain configuration for a REST API.
#[derive(Debug, Clone)]
pub struct DomainProps {
    pub domain_name: String,
    pub certificate_arn: Value,
}

/// Handle to a declared custom domain, exposing the alias target the DNS
/// record points at.
#[derive(Debug, Clone)]
pub struct DomainHandle {
    logical_id: String,
    domain_name: String,
}

impl DomainHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Alias target at the domain's CloudFront distribution.
    pub fn alias_target(&self) -> AliasTarget {
        AliasTarget {
            dns_name: intrinsics::get_att(&self.logical_id, "DistributionDomainName"),
            hosted_zone_id: intrinsics::get_att(&self.logical_id, "DistributionHostedZoneId"),
        }
    }
}

impl RestApi {
    /// Bind a custom domain (TLS 1.2, edge) to this API's stage.
    pub fn attach_domain(
        &self,
        stack: &mut Stack,
        id: &str,
        props: DomainProps,
        stage_logical_id: &str,
        stage_name: &str,
    ) -> SynthResult<DomainHandle> {
        let domain_id = stack.add_resource(
            id,
            Resource::new("AWS::ApiGateway::DomainName")
                .prop("DomainName", json!(props.domain_name))
                .prop("CertificateArn", props.certificate_arn)
                .prop("EndpointConfiguration", json!({ "Types": ["EDGE"] }))
                .prop("SecurityPolicy", json!("TLS_1_2")),
        )?;

        stack.add_resource(
            &format!("{domain_id}Mapping"),
            Resource::new("AWS::ApiGateway::BasePathMapping")
                .prop("DomainName", intrinsics::r#ref(&domain_id))
                .prop("RestApiId", self.api_ref())
                .prop("Stage", json!(stage_name))
                .depends_on(stage_logical_id),
        )?;

        Ok(DomainHandle {
            logical_id: domain_id,
            domain_name: props.domain_name,
        })
    }
}

/// Turn a path like `/posts/{postId}` into a logical-ID fragment
/// (`PostsPostId`).
fn path_title(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let cleaned: String = segment
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            let mut chars = cleaned.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("")
}
