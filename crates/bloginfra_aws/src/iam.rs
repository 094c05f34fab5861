//! IAM building blocks: policy statements and service roles.

use serde_json::{json, Value};

use bloginfra_core::intrinsics;
use bloginfra_core::{Resource, Stack, SynthResult};

/// One allow-statement over a set of actions and resources.
#[derive(Debug, Clone)]
pub struct PolicyStatement {
    actions: Vec<String>,
    resources: Vec<Value>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: Vec<Value>) -> Self {
        Self {
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "Effect": "Allow",
            "Action": self.actions,
            "Resource": self.resources,
        })
    }
}

/// An execution role assumable by a single service principal.
///
/// Every function gets its own role; there is no shared execution role, so
/// grants stay scoped to exactly the principal that needs them.
#[derive(Debug, Clone)]
pub struct ServiceRole {
    logical_id: String,
    policy_count: u32,
}

impl ServiceRole {
    /// Declare a role assumable by `service` (e.g. `lambda.amazonaws.com`).
    pub fn new(
        stack: &mut Stack,
        id: &str,
        service: &str,
        managed_policy_arns: &[&str],
    ) -> SynthResult<Self> {
        let resource = Resource::new("AWS::IAM::Role")
            .prop(
                "AssumeRolePolicyDocument",
                json!({
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": service },
                        "Action": "sts:AssumeRole",
                    }],
                }),
            )
            .prop_opt(
                "ManagedPolicyArns",
                if managed_policy_arns.is_empty() {
                    None
                } else {
                    Some(json!(managed_policy_arns))
                },
            );

        let logical_id = stack.add_resource(id, resource)?;
        Ok(Self {
            logical_id,
            policy_count: 0,
        })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// `Fn::GetAtt` for the role ARN.
    pub fn arn(&self) -> Value {
        intrinsics::get_att(&self.logical_id, "Arn")
    }

    /// Attach an inline policy with the given statements to this role.
    pub fn attach_policy(
        &mut self,
        stack: &mut Stack,
        name: &str,
        statements: &[PolicyStatement],
    ) -> SynthResult<String> {
        self.policy_count += 1;
        let id = format!("{}Policy{}", self.logical_id, self.policy_count);
        let resource = Resource::new("AWS::IAM::Policy")
            .prop("PolicyName", json!(name))
            .prop(
                "PolicyDocument",
                json!({
                    "Version": "2012-10-17",
                    "Statement": statements.iter().map(|s| s.to_value()).collect::<Vec<_>>(),
                }),
            )
            .prop("Roles", json!([intrinsics::r#ref(&self.logical_id)]));
        stack.add_resource(&id, resource)
    }
}
