//! # bloginfra_core
//!
//! Deterministic CloudFormation synthesis engine for bloginfra.
//!
//! This crate provides the resource and stack model the typed constructs in
//! `bloginfra_aws` build on: logical IDs, intrinsic functions, outputs with
//! exports, stage-level dependency edges, lookup context for pre-provisioned
//! resources, and cloud-assembly output.
//!
//! ## Example
//!
//! ```rust
//! use bloginfra_core::{Environment, Resource, Stack, Stage};
//! use serde_json::json;
//!
//! let mut stack = Stack::new("demo-data");
//! stack
//!     .add_resource(
//!         "DemoTable",
//!         Resource::new("AWS::DynamoDB::Table")
//!             .prop("TableName", json!("Demo"))
//!             .prop("BillingMode", json!("PAY_PER_REQUEST")),
//!     )
//!     .unwrap();
//!
//! let mut stage = Stage::new("prod", Environment::new("111111111111", "us-east-1"));
//! stage.add_stack(stack).unwrap();
//! let assembly = stage.synth().unwrap();
//! assert_eq!(assembly.deploy_order(), ["demo-data"]);
//! ```

pub mod assembly;
pub mod context;
pub mod error;
pub mod intrinsics;
pub mod resource;
pub mod stack;
pub mod stage;

pub use assembly::CloudAssembly;
pub use context::{Context, HostedZoneAttributes};
pub use error::{SynthError, SynthResult};
pub use resource::{RemovalPolicy, Resource};
pub use stack::{Output, Stack};
pub use stage::{Environment, Stage};
