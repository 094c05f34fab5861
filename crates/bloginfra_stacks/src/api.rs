//! API stack: four single-purpose functions behind an authorized REST API
//! with a custom domain and DNS alias.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use bloginfra_aws::{
    ARecord, Authorization, Code, CognitoAuthorizer, DomainProps, Function, FunctionHandle,
    FunctionProps, Integration, RestApi, RestApiProps, Runtime,
};
use bloginfra_core::intrinsics;
use bloginfra_core::Stack;

use crate::auth::AuthStackOutputs;
use crate::certificate::CertificateStackOutputs;
use crate::config::InfraConfig;
use crate::data::DataStackOutputs;
use crate::error::StackResult;

fn post_function(
    stack: &mut Stack,
    id: &str,
    function_name: &str,
    asset: &str,
    table_name: Value,
) -> StackResult<FunctionHandle> {
    let mut environment = BTreeMap::new();
    environment.insert("POSTS_TABLE_NAME".to_string(), table_name);
    Ok(Function::new(
        stack,
        id,
        FunctionProps {
            function_name: function_name.to_string(),
            handler: "app.handler".to_string(),
            runtime: Runtime::Python39,
            code: Code::from_asset(asset),
            environment,
        },
    )?)
}

/// Build the API stack.
///
/// Every business route is gated by a Cognito authorizer requiring the
/// scope matching its verb; `/authUser` is open at the gateway and performs
/// its own credential check against the directory. Table access is granted
/// per function, read-write only where writes happen.
pub fn api_stack(
    config: &InfraConfig,
    data: &DataStackOutputs,
    auth: &AuthStackOutputs,
    certificate: &CertificateStackOutputs,
) -> StackResult<Stack> {
    let mut stack = Stack::new(config.stack_name("blog-api"))
        .with_description("REST API, functions and DNS alias for the blog backend");

    // Functions, one route each.
    let mut create_post = post_function(
        &mut stack,
        "CreatePostFunction",
        "CreatePost",
        "lambdas/create_post",
        data.posts_table.table_name_import(),
    )?;
    let mut list_posts = post_function(
        &mut stack,
        "ListPostsFunction",
        "ListPosts",
        "lambdas/list_posts",
        data.posts_table.table_name_import(),
    )?;
    let mut get_post = post_function(
        &mut stack,
        "GetPostFunction",
        "GetPost",
        "lambdas/get_post",
        data.posts_table.table_name_import(),
    )?;

    let mut auth_environment = BTreeMap::new();
    auth_environment.insert("USER_POOL_ID".to_string(), auth.user_pool.pool_id_import());
    auth_environment.insert(
        "USER_POOL_CLIENT_ID".to_string(),
        auth.user_pool_client.client_id_import(),
    );
    let mut auth_user = Function::new(
        &mut stack,
        "AuthUserFunction",
        FunctionProps {
            function_name: "AuthUser".to_string(),
            handler: "app.handler".to_string(),
            runtime: Runtime::Python39,
            code: Code::from_asset("lambdas/auth_user"),
            environment: auth_environment,
        },
    )?;

    // Least-privilege grants, per function.
    data.posts_table
        .grant_read_write_data(&mut stack, &mut create_post)?;
    data.posts_table.grant_read_data(&mut stack, &mut list_posts)?;
    data.posts_table.grant_read_data(&mut stack, &mut get_post)?;
    auth_user.add_to_role_policy(
        &mut stack,
        "parameter-read",
        &["ssm:GetParameter"],
        vec![intrinsics::sub(
            "arn:aws:ssm:${AWS::Region}:${AWS::AccountId}:parameter/*",
        )],
    )?;
    auth_user.add_to_role_policy(
        &mut stack,
        "admin-initiate-auth",
        &["cognito-idp:AdminInitiateAuth"],
        vec![auth.user_pool.pool_arn_import()],
    )?;

    // The gateway, its authorizer and the route tree.
    let mut api = RestApi::new(
        &mut stack,
        "BlogApi",
        RestApiProps {
            rest_api_name: "Blog API".to_string(),
        },
    )?;
    let authorizer = CognitoAuthorizer::new(
        &mut stack,
        "CognitoAPIAuthorizer",
        &api,
        "CognitoAPIAuthorizer",
        vec![auth.user_pool.pool_arn_import()],
    )?;
    let require = |scope: &str| Authorization::Cognito {
        authorizer_id: authorizer.authorizer_ref(),
        scopes: vec![scope.to_string()],
    };

    api.add_cors_preflight(&mut stack, "/")?;

    let posts = api.add_resource(&mut stack, "/", "posts")?;
    api.add_method(
        &mut stack,
        &posts,
        "GET",
        Integration::Lambda(&list_posts),
        require(&auth.read_scope),
    )?;

    let get_one = api.add_resource(&mut stack, &posts, "{postId}")?;
    api.add_method(
        &mut stack,
        &get_one,
        "GET",
        Integration::Lambda(&get_post),
        require(&auth.read_scope),
    )?;

    let create = api.add_resource(&mut stack, &posts, "create")?;
    api.add_method(
        &mut stack,
        &create,
        "POST",
        Integration::Lambda(&create_post),
        require(&auth.write_scope),
    )?;

    let auth_route = api.add_resource(&mut stack, "/", "authUser")?;
    api.add_method(
        &mut stack,
        &auth_route,
        "POST",
        Integration::Lambda(&auth_user),
        Authorization::None,
    )?;

    // Deployment, custom domain, DNS alias.
    let stage_id = api.deploy(&mut stack, &config.stage_name)?;
    let api_domain = config.api_domain_name();
    let domain = api.attach_domain(
        &mut stack,
        "BlogApiDomain",
        DomainProps {
            domain_name: api_domain.clone(),
            certificate_arn: certificate.certificate.certificate_arn_import(),
        },
        &stage_id,
        &config.stage_name,
    )?;
    ARecord::new(
        &mut stack,
        "BlogApiRecord",
        &certificate.zone,
        domain.domain_name(),
        domain.alias_target(),
    )?;

    info!(domain = %api_domain, "built api stack");
    Ok(stack)
}
