//! Lambda function construct.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::debug;

use bloginfra_core::intrinsics;
use bloginfra_core::{Resource, Stack, SynthResult};

use crate::iam::{PolicyStatement, ServiceRole};

const BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Supported function runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Python39,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Python39 => "python3.9",
        }
    }
}

/// Where the function code comes from. Handlers are external artifacts; the
/// asset directory is recorded in the assembly manifest and packaged by the
/// pipeline, never bundled at synth time.
#[derive(Debug, Clone)]
pub enum Code {
    Asset(String),
}

impl Code {
    pub fn from_asset(path: impl Into<String>) -> Self {
        Code::Asset(path.into())
    }

    fn to_value(&self) -> Value {
        match self {
            Code::Asset(path) => {
                let key: String = path
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                    .collect();
                json!({
                    "S3Bucket": { "Fn::Sub": "bloginfra-assets-${AWS::AccountId}-${AWS::Region}" },
                    "S3Key": format!("{key}.zip"),
                })
            }
        }
    }
}

/// Function configuration.
#[derive(Debug, Clone)]
pub struct FunctionProps {
    pub function_name: String,
    pub handler: String,
    pub runtime: Runtime,
    pub code: Code,
    pub environment: BTreeMap<String, Value>,
}

/// Handle to a declared function and its dedicated execution role.
#[derive(Debug)]
pub struct FunctionHandle {
    logical_id: String,
    function_name: String,
    role: ServiceRole,
}

/// Lambda function construct. Each function gets its own execution role so
/// grants stay per-function.
pub struct Function;

impl Function {
    pub fn new(stack: &mut Stack, id: &str, props: FunctionProps) -> SynthResult<FunctionHandle> {
        let role = ServiceRole::new(
            stack,
            &format!("{id}Role"),
            "lambda.amazonaws.com",
            &[BASIC_EXECUTION_POLICY],
        )?;

        let mut variables = Map::new();
        for (key, value) in &props.environment {
            variables.insert(key.clone(), value.clone());
        }

        let resource = Resource::new("AWS::Lambda::Function")
            .prop("FunctionName", json!(props.function_name))
            .prop("Handler", json!(props.handler))
            .prop("Runtime", json!(props.runtime.as_str()))
            .prop("Code", props.code.to_value())
            .prop("Role", role.arn())
            .prop_opt(
                "Environment",
                if variables.is_empty() {
                    None
                } else {
                    Some(json!({ "Variables": variables }))
                },
            )
            .depends_on(role.logical_id());

        let logical_id = stack.add_resource(id, resource)?;
        if let Code::Asset(path) = &props.code {
            stack.add_asset(path.clone());
        }
        debug!(function = %props.function_name, %logical_id, "declared function");

        Ok(FunctionHandle {
            logical_id,
            function_name: props.function_name,
            role,
        })
    }
}

impl FunctionHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// `Fn::GetAtt` for the function ARN.
    pub fn arn(&self) -> Value {
        intrinsics::get_att(&self.logical_id, "Arn")
    }

    /// Attach an allow-policy to this function's execution role.
    pub fn add_to_role_policy(
        &mut self,
        stack: &mut Stack,
        name: &str,
        actions: &[&str],
        resources: Vec<Value>,
    ) -> SynthResult<String> {
        self.role
            .attach_policy(stack, name, &[PolicyStatement::allow(actions, resources)])
    }

    /// Allow API Gateway to invoke this function.
    pub fn grant_invoke_from_api(&self, stack: &mut Stack, api_logical_id: &str) -> SynthResult<String> {
        let resource = Resource::new("AWS::Lambda::Permission")
            .prop("Action", json!("lambda:InvokeFunction"))
            .prop("FunctionName", self.arn())
            .prop("Principal", json!("apigateway.amazonaws.com"))
            .prop(
                "SourceArn",
                intrinsics::sub(&format!(
                    "arn:aws:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{api_logical_id}}}/*/*/*"
                )),
            );
        stack.add_resource(&format!("{}ApiPermission", self.logical_id), resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> FunctionProps {
        let mut environment = BTreeMap::new();
        environment.insert("POSTS_TABLE_NAME".to_string(), json!("Posts-prod"));
        FunctionProps {
            function_name: "ListPosts".to_string(),
            handler: "app.handler".to_string(),
            runtime: Runtime::Python39,
            code: Code::from_asset("lambdas/list_posts"),
            environment,
        }
    }

    #[test]
    fn test_function_declares_dedicated_role() {
        let mut stack = Stack::new("blog-api-prod");
        let function = Function::new(&mut stack, "ListPostsFunction", props()).unwrap();

        let template = stack.to_template_value();
        let fn_entry = &template["Resources"][function.logical_id()];
        assert_eq!(fn_entry["Properties"]["Runtime"], "python3.9");
        assert_eq!(fn_entry["Properties"]["Handler"], "app.handler");
        assert_eq!(
            fn_entry["Properties"]["Role"],
            json!({ "Fn::GetAtt": ["ListPostsFunctionRole", "Arn"] })
        );
        assert_eq!(
            fn_entry["Properties"]["Environment"]["Variables"]["POSTS_TABLE_NAME"],
            "Posts-prod"
        );
        assert!(template["Resources"].get("ListPostsFunctionRole").is_some());
    }

    #[test]
    fn test_asset_is_recorded_on_stack() {
        let mut stack = Stack::new("blog-api-prod");
        Function::new(&mut stack, "ListPostsFunction", props()).unwrap();
        assert_eq!(stack.assets(), ["lambdas/list_posts"]);
    }

    #[test]
    fn test_invoke_permission_scopes_to_api() {
        let mut stack = Stack::new("blog-api-prod");
        let function = Function::new(&mut stack, "ListPostsFunction", props()).unwrap();
        let permission_id = function.grant_invoke_from_api(&mut stack, "BlogApi").unwrap();

        let template = stack.to_template_value();
        let props = &template["Resources"][permission_id.as_str()]["Properties"];
        assert_eq!(props["Principal"], "apigateway.amazonaws.com");
        assert!(props["SourceArn"]["Fn::Sub"]
            .as_str()
            .unwrap()
            .contains("${BlogApi}"));
    }
}
