//! Auth stack: Cognito user pool, resource server, app client, OAuth domain.

use tracing::info;

use bloginfra_aws::{
    AccountRecovery, AuthFlows, OAuthSettings, ResourceServer, ResourceServerScope, UserPool,
    UserPoolClient, UserPoolClientHandle, UserPoolClientProps, UserPoolDomain, UserPoolHandle,
    UserPoolProps, VerificationEmail,
};
use bloginfra_core::{RemovalPolicy, Stack};

use crate::config::InfraConfig;
use crate::error::StackResult;

/// Handles and scope names the API stack consumes.
pub struct AuthStackOutputs {
    pub user_pool: UserPoolHandle,
    pub user_pool_client: UserPoolClientHandle,
    pub read_scope: String,
    pub write_scope: String,
}

/// Build the auth stack: a user directory with self-service sign-up, email
/// as both the sign-in alias and the verification channel, and email-only
/// account recovery, plus an OAuth resource server exposing `blogapi.read`
/// and `blogapi.write` and one app client. Token lifetimes are fixed
/// configuration values.
pub fn auth_stack(config: &InfraConfig) -> StackResult<(Stack, AuthStackOutputs)> {
    let mut stack = Stack::new(config.stack_name("blog-auth"))
        .with_description("User directory and OAuth surface for the blog API");

    let user_pool = UserPool::new(
        &mut stack,
        "UserPool",
        UserPoolProps {
            user_pool_name: format!("blogapi-userpool-{}", config.stage_name),
            self_sign_up_enabled: true,
            sign_in_email_alias: true,
            auto_verify_email: true,
            account_recovery: AccountRecovery::EmailOnly,
            user_verification: Some(VerificationEmail {
                subject: "Verify your email for our awesome app!".to_string(),
                body: "Hello {username}, Thanks for signing up to our awesome app! \
                       Your verification code is {####}"
                    .to_string(),
            }),
            removal_policy: RemovalPolicy::Destroy,
        },
    )?;

    let read_scope = ResourceServerScope::new("blogapi.read", "blogapi read scope");
    let write_scope = ResourceServerScope::new("blogapi.write", "blogapi write scope");
    let resource_server = ResourceServer::new(
        &mut stack,
        "BlogapiResourceServer",
        &user_pool,
        "blogapi-resource-server",
        &[read_scope.clone(), write_scope.clone()],
    )?;

    let read_scope = resource_server.full_scope_name(&read_scope);
    let write_scope = resource_server.full_scope_name(&write_scope);

    let user_pool_client = UserPoolClient::new(
        &mut stack,
        "UserPoolClient",
        &user_pool,
        UserPoolClientProps {
            client_name: format!("blogapi-client-{}", config.stage_name),
            generate_secret: true,
            auth_flows: AuthFlows {
                user_password: true,
                admin_user_password: true,
                user_srp: true,
                custom: true,
            },
            o_auth: Some(OAuthSettings {
                client_credentials: true,
                scopes: vec![read_scope.clone(), write_scope.clone()],
            }),
            access_token_validity_minutes: 60,
            id_token_validity_minutes: 60,
            refresh_token_validity_days: 1,
            enable_token_revocation: true,
        },
        Some(resource_server.logical_id()),
    )?;

    UserPoolDomain::new(
        &mut stack,
        "BlogApiDomain",
        &user_pool,
        &format!("blogapi-domain-{}", config.stage_name),
    )?;

    info!(stage = %config.stage_name, "built auth stack");
    Ok((
        stack,
        AuthStackOutputs {
            user_pool,
            user_pool_client,
            read_scope,
            write_scope,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scopes_are_resource_server_qualified() {
        let config = InfraConfig::default();
        let (_, outputs) = auth_stack(&config).unwrap();
        assert_eq!(outputs.read_scope, "blogapi-resource-server/blogapi.read");
        assert_eq!(outputs.write_scope, "blogapi-resource-server/blogapi.write");
    }

    #[test]
    fn test_pool_is_self_service_with_email_recovery() {
        let config = InfraConfig::default();
        let (stack, outputs) = auth_stack(&config).unwrap();

        let template = stack.to_template_value();
        let props = &template["Resources"][outputs.user_pool.logical_id()]["Properties"];
        assert_eq!(
            props["AdminCreateUserConfig"]["AllowAdminCreateUserOnly"],
            json!(false)
        );
        assert_eq!(props["UsernameAttributes"], json!(["email"]));
        assert_eq!(
            props["AccountRecoverySetting"]["RecoveryMechanisms"],
            json!([{ "Name": "verified_email", "Priority": 1 }])
        );
    }

    #[test]
    fn test_client_is_ordered_after_resource_server() {
        let config = InfraConfig::default();
        let (stack, outputs) = auth_stack(&config).unwrap();

        let template = stack.to_template_value();
        let entry = &template["Resources"][outputs.user_pool_client.logical_id()];
        assert_eq!(entry["DependsOn"], json!(["BlogapiResourceServer"]));
    }

    #[test]
    fn test_domain_prefix_is_stage_qualified() {
        let config = InfraConfig::default().with_stage("dev");
        let (stack, _) = auth_stack(&config).unwrap();

        let template = stack.to_template_value();
        assert_eq!(
            template["Resources"]["BlogApiDomain"]["Properties"]["Domain"],
            "blogapi-domain-dev"
        );
    }
}
