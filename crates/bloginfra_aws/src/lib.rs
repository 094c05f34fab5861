//! # bloginfra_aws
//!
//! Typed construct wrappers over the raw resource model in `bloginfra_core`.
//!
//! Each module covers one service: a `*Props` struct describing the desired
//! configuration and a handle struct exposing the attributes (`Ref`,
//! `Fn::GetAtt`, exported imports) downstream constructs consume. Handles are
//! read-only: a construct never mutates a resource another stack owns, it
//! only references it and attaches narrowly scoped grants to its own
//! principals.

pub mod acm;
pub mod apigateway;
pub mod codepipeline;
pub mod cognito;
pub mod dynamodb;
pub mod iam;
pub mod lambda;
pub mod route53;

pub use acm::{Certificate, CertificateHandle, CertificateProps};
pub use apigateway::{
    Authorization, CognitoAuthorizer, CorsPreflight, DomainHandle, DomainProps, Integration,
    RestApi, RestApiProps,
};
pub use codepipeline::{GitHubSource, Pipeline, PipelineProps, ShellStep, StackDeployment};
pub use cognito::{
    AccountRecovery, AuthFlows, OAuthSettings, ResourceServer, ResourceServerHandle,
    ResourceServerScope, UserPool, UserPoolClient, UserPoolClientHandle, UserPoolClientProps,
    UserPoolDomain, UserPoolHandle, UserPoolProps, VerificationEmail,
};
pub use dynamodb::{Attribute, AttributeType, Table, TableHandle, TableProps};
pub use iam::{PolicyStatement, ServiceRole};
pub use lambda::{Code, Function, FunctionHandle, FunctionProps, Runtime};
pub use route53::{AliasTarget, ARecord};
