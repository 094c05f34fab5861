//! # bloginfra_stacks
//!
//! The concrete infrastructure units for the blog API backend, in dependency
//! order (leaves first):
//!
//! - [`certificate`] — DNS zone lookup plus a DNS-validated TLS certificate
//!   for the API's custom domain.
//! - [`data`] — the `Posts` table (partition key `id`, string,
//!   destroy-on-teardown).
//! - [`auth`] — Cognito user pool, resource server with read/write scopes,
//!   app client, hosted OAuth domain.
//! - [`api`] — four single-purpose Lambda functions behind an authorized
//!   REST API with a custom domain and DNS alias.
//! - [`stage`] — composition root wiring the four stacks with explicit
//!   dependency edges.
//! - [`pipeline`] — the CodePipeline stack deploying the stage.
//!
//! Control flow is purely declarative: every builder assembles a static
//! resource graph at synthesis time.

pub mod api;
pub mod auth;
pub mod certificate;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod stage;

pub use config::{HostedZoneEntry, InfraConfig};
pub use error::{StackError, StackResult};
pub use stage::api_stage;
