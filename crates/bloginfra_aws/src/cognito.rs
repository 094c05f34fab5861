//! Cognito constructs: user pool, resource server, app client, hosted domain.

use serde_json::{json, Value};
use tracing::debug;

use bloginfra_core::intrinsics;
use bloginfra_core::{RemovalPolicy, Resource, Stack, SynthResult};

/// Account recovery channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRecovery {
    EmailOnly,
}

impl AccountRecovery {
    fn to_value(self) -> Value {
        match self {
            AccountRecovery::EmailOnly => json!({
                "RecoveryMechanisms": [
                    { "Name": "verified_email", "Priority": 1 }
                ]
            }),
        }
    }
}

/// Verification email sent on sign-up.
#[derive(Debug, Clone)]
pub struct VerificationEmail {
    pub subject: String,
    pub body: String,
}

/// User pool configuration.
#[derive(Debug, Clone)]
pub struct UserPoolProps {
    pub user_pool_name: String,
    pub self_sign_up_enabled: bool,
    pub sign_in_email_alias: bool,
    pub auto_verify_email: bool,
    pub account_recovery: AccountRecovery,
    pub user_verification: Option<VerificationEmail>,
    pub removal_policy: RemovalPolicy,
}

/// Read-only handle to a declared user pool, carrying the import
/// expressions downstream stacks use.
#[derive(Debug, Clone)]
pub struct UserPoolHandle {
    logical_id: String,
    id_import: Value,
    arn_import: Value,
}

/// Cognito user pool construct.
pub struct UserPool;

impl UserPool {
    /// Declare a user pool and export its ID and ARN.
    pub fn new(stack: &mut Stack, id: &str, props: UserPoolProps) -> SynthResult<UserPoolHandle> {
        let resource = Resource::new("AWS::Cognito::UserPool")
            .prop("UserPoolName", json!(props.user_pool_name))
            .prop(
                "AdminCreateUserConfig",
                json!({ "AllowAdminCreateUserOnly": !props.self_sign_up_enabled }),
            )
            .prop_opt(
                "UsernameAttributes",
                props.sign_in_email_alias.then(|| json!(["email"])),
            )
            .prop_opt(
                "AutoVerifiedAttributes",
                props.auto_verify_email.then(|| json!(["email"])),
            )
            .prop("AccountRecoverySetting", props.account_recovery.to_value())
            .prop_opt(
                "VerificationMessageTemplate",
                props.user_verification.as_ref().map(|v| {
                    json!({
                        "DefaultEmailOption": "CONFIRM_WITH_CODE",
                        "EmailSubject": v.subject,
                        "EmailMessage": v.body,
                    })
                }),
            )
            .removal_policy(props.removal_policy);

        let logical_id = stack.add_resource(id, resource)?;
        debug!(pool = %props.user_pool_name, %logical_id, "declared user pool");

        let id_import = stack.export(&format!("{logical_id}Id"), intrinsics::r#ref(&logical_id));
        let arn_import = stack.export(
            &format!("{logical_id}Arn"),
            intrinsics::get_att(&logical_id, "Arn"),
        );

        Ok(UserPoolHandle {
            logical_id,
            id_import,
            arn_import,
        })
    }
}

impl UserPoolHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Same-stack reference to the pool ID.
    pub fn pool_id_ref(&self) -> Value {
        intrinsics::r#ref(&self.logical_id)
    }

    /// Same-stack reference to the pool ARN.
    pub fn pool_arn(&self) -> Value {
        intrinsics::get_att(&self.logical_id, "Arn")
    }

    /// Import expression for the pool ID.
    pub fn pool_id_import(&self) -> Value {
        self.id_import.clone()
    }

    /// Import expression for the pool ARN.
    pub fn pool_arn_import(&self) -> Value {
        self.arn_import.clone()
    }
}

/// One scope exposed by a resource server.
#[derive(Debug, Clone)]
pub struct ResourceServerScope {
    pub scope_name: String,
    pub scope_description: String,
}

impl ResourceServerScope {
    pub fn new(scope_name: impl Into<String>, scope_description: impl Into<String>) -> Self {
        Self {
            scope_name: scope_name.into(),
            scope_description: scope_description.into(),
        }
    }
}

/// Handle to a declared resource server. Full scope names are
/// `<identifier>/<scope>`, the form the authorizer and the client use.
#[derive(Debug, Clone)]
pub struct ResourceServerHandle {
    logical_id: String,
    identifier: String,
}

impl ResourceServerHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn full_scope_name(&self, scope: &ResourceServerScope) -> String {
        format!("{}/{}", self.identifier, scope.scope_name)
    }
}

/// OAuth resource server construct.
pub struct ResourceServer;

impl ResourceServer {
    pub fn new(
        stack: &mut Stack,
        id: &str,
        user_pool: &UserPoolHandle,
        identifier: &str,
        scopes: &[ResourceServerScope],
    ) -> SynthResult<ResourceServerHandle> {
        let resource = Resource::new("AWS::Cognito::UserPoolResourceServer")
            .prop("Identifier", json!(identifier))
            .prop("Name", json!(identifier))
            .prop("UserPoolId", user_pool.pool_id_ref())
            .prop(
                "Scopes",
                Value::Array(
                    scopes
                        .iter()
                        .map(|s| {
                            json!({
                                "ScopeName": s.scope_name,
                                "ScopeDescription": s.scope_description,
                            })
                        })
                        .collect(),
                ),
            );

        let logical_id = stack.add_resource(id, resource)?;
        Ok(ResourceServerHandle {
            logical_id,
            identifier: identifier.to_string(),
        })
    }
}

/// Authentication flows enabled on an app client. Refresh-token auth is
/// always allowed alongside any explicit flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthFlows {
    pub user_password: bool,
    pub admin_user_password: bool,
    pub user_srp: bool,
    pub custom: bool,
}

impl AuthFlows {
    fn to_value(self) -> Option<Value> {
        let mut flows = Vec::new();
        if self.admin_user_password {
            flows.push("ALLOW_ADMIN_USER_PASSWORD_AUTH");
        }
        if self.custom {
            flows.push("ALLOW_CUSTOM_AUTH");
        }
        if self.user_password {
            flows.push("ALLOW_USER_PASSWORD_AUTH");
        }
        if self.user_srp {
            flows.push("ALLOW_USER_SRP_AUTH");
        }
        if flows.is_empty() {
            return None;
        }
        flows.push("ALLOW_REFRESH_TOKEN_AUTH");
        Some(json!(flows))
    }
}

/// OAuth settings for an app client.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_credentials: bool,
    pub scopes: Vec<String>,
}

/// App client configuration. Token lifetimes are fixed configuration
/// values, never computed.
#[derive(Debug, Clone)]
pub struct UserPoolClientProps {
    pub client_name: String,
    pub generate_secret: bool,
    pub auth_flows: AuthFlows,
    pub o_auth: Option<OAuthSettings>,
    pub access_token_validity_minutes: u32,
    pub id_token_validity_minutes: u32,
    pub refresh_token_validity_days: u32,
    pub enable_token_revocation: bool,
}

/// Handle to a declared app client.
#[derive(Debug, Clone)]
pub struct UserPoolClientHandle {
    logical_id: String,
    id_import: Value,
}

impl UserPoolClientHandle {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Import expression for the client ID.
    pub fn client_id_import(&self) -> Value {
        self.id_import.clone()
    }
}

/// User pool app client construct.
pub struct UserPoolClient;

impl UserPoolClient {
    /// Declare an app client and export its ID.
    ///
    /// `depends_on` lets the caller order the client after the resource
    /// server its OAuth scopes reference.
    pub fn new(
        stack: &mut Stack,
        id: &str,
        user_pool: &UserPoolHandle,
        props: UserPoolClientProps,
        depends_on: Option<&str>,
    ) -> SynthResult<UserPoolClientHandle> {
        let mut resource = Resource::new("AWS::Cognito::UserPoolClient")
            .prop("ClientName", json!(props.client_name))
            .prop("UserPoolId", user_pool.pool_id_ref())
            .prop("GenerateSecret", json!(props.generate_secret))
            .prop_opt("ExplicitAuthFlows", props.auth_flows.to_value())
            .prop("AccessTokenValidity", json!(props.access_token_validity_minutes))
            .prop("IdTokenValidity", json!(props.id_token_validity_minutes))
            .prop("RefreshTokenValidity", json!(props.refresh_token_validity_days))
            .prop(
                "TokenValidityUnits",
                json!({
                    "AccessToken": "minutes",
                    "IdToken": "minutes",
                    "RefreshToken": "days",
                }),
            )
            .prop("EnableTokenRevocation", json!(props.enable_token_revocation));

        if let Some(o_auth) = &props.o_auth {
            if o_auth.client_credentials {
                resource = resource
                    .prop("AllowedOAuthFlows", json!(["client_credentials"]))
                    .prop("AllowedOAuthFlowsUserPoolClient", json!(true));
            }
            resource = resource.prop("AllowedOAuthScopes", json!(o_auth.scopes));
        }
        if let Some(dep) = depends_on {
            resource = resource.depends_on(dep);
        }

        let logical_id = stack.add_resource(id, resource)?;
        let id_import = stack.export(&format!("{logical_id}Id"), intrinsics::r#ref(&logical_id));

        Ok(UserPoolClientHandle {
            logical_id,
            id_import,
        })
    }
}

/// Hosted OAuth domain with a Cognito-managed prefix.
pub struct UserPoolDomain;

impl UserPoolDomain {
    pub fn new(
        stack: &mut Stack,
        id: &str,
        user_pool: &UserPoolHandle,
        domain_prefix: &str,
    ) -> SynthResult<String> {
        let resource = Resource::new("AWS::Cognito::UserPoolDomain")
            .prop("Domain", json!(domain_prefix))
            .prop("UserPoolId", user_pool.pool_id_ref());
        stack.add_resource(id, resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_props() -> UserPoolProps {
        UserPoolProps {
            user_pool_name: "blogapi-userpool-prod".to_string(),
            self_sign_up_enabled: true,
            sign_in_email_alias: true,
            auto_verify_email: true,
            account_recovery: AccountRecovery::EmailOnly,
            user_verification: Some(VerificationEmail {
                subject: "Verify your email".to_string(),
                body: "Your verification code is {####}".to_string(),
            }),
            removal_policy: RemovalPolicy::Destroy,
        }
    }

    #[test]
    fn test_user_pool_email_policy() {
        let mut stack = Stack::new("blog-auth-prod");
        let pool = UserPool::new(&mut stack, "UserPool", pool_props()).unwrap();

        let template = stack.to_template_value();
        let props = &template["Resources"][pool.logical_id()]["Properties"];
        assert_eq!(props["UsernameAttributes"], json!(["email"]));
        assert_eq!(props["AutoVerifiedAttributes"], json!(["email"]));
        assert_eq!(
            props["AdminCreateUserConfig"]["AllowAdminCreateUserOnly"],
            json!(false)
        );
        assert_eq!(
            props["AccountRecoverySetting"]["RecoveryMechanisms"][0]["Name"],
            "verified_email"
        );
    }

    #[test]
    fn test_resource_server_scopes() {
        let mut stack = Stack::new("blog-auth-prod");
        let pool = UserPool::new(&mut stack, "UserPool", pool_props()).unwrap();
        let read = ResourceServerScope::new("blogapi.read", "blogapi read scope");
        let server = ResourceServer::new(
            &mut stack,
            "BlogapiResourceServer",
            &pool,
            "blogapi-resource-server",
            &[read.clone()],
        )
        .unwrap();

        assert_eq!(
            server.full_scope_name(&read),
            "blogapi-resource-server/blogapi.read"
        );
    }

    #[test]
    fn test_client_auth_flows_and_token_validity() {
        let mut stack = Stack::new("blog-auth-prod");
        let pool = UserPool::new(&mut stack, "UserPool", pool_props()).unwrap();
        let client = UserPoolClient::new(
            &mut stack,
            "UserPoolClient",
            &pool,
            UserPoolClientProps {
                client_name: "blogapi-client-prod".to_string(),
                generate_secret: true,
                auth_flows: AuthFlows {
                    user_password: true,
                    admin_user_password: true,
                    user_srp: true,
                    custom: true,
                },
                o_auth: Some(OAuthSettings {
                    client_credentials: true,
                    scopes: vec!["blogapi-resource-server/blogapi.read".to_string()],
                }),
                access_token_validity_minutes: 60,
                id_token_validity_minutes: 60,
                refresh_token_validity_days: 1,
                enable_token_revocation: true,
            },
            None,
        )
        .unwrap();

        let template = stack.to_template_value();
        let props = &template["Resources"][client.logical_id()]["Properties"];
        assert_eq!(
            props["ExplicitAuthFlows"],
            json!([
                "ALLOW_ADMIN_USER_PASSWORD_AUTH",
                "ALLOW_CUSTOM_AUTH",
                "ALLOW_USER_PASSWORD_AUTH",
                "ALLOW_USER_SRP_AUTH",
                "ALLOW_REFRESH_TOKEN_AUTH"
            ])
        );
        assert_eq!(props["AccessTokenValidity"], 60);
        assert_eq!(props["RefreshTokenValidity"], 1);
        assert_eq!(props["TokenValidityUnits"]["RefreshToken"], "days");
        assert_eq!(props["AllowedOAuthFlows"], json!(["client_credentials"]));
    }
}
