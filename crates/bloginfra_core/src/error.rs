//! Error types for the synthesis engine.

use thiserror::Error;

/// Result type alias for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors that can occur during synthesis.
///
/// All of these are fatal: synthesis either produces a complete, validated
/// assembly or fails with the first structural problem it finds.
#[derive(Error, Debug)]
pub enum SynthError {
    #[error("duplicate logical id `{logical_id}` in stack `{stack}`")]
    DuplicateLogicalId { stack: String, logical_id: String },

    #[error("duplicate stack `{0}` in stage")]
    DuplicateStack(String),

    #[error("unknown stack `{0}` referenced in dependency edge")]
    UnknownStack(String),

    #[error("dependency cycle involving stack `{0}`")]
    DependencyCycle(String),

    #[error("stack `{stack}` imports `{export_name}` but no stack in the stage exports it")]
    MissingExport { stack: String, export_name: String },

    #[error("duplicate export name `{0}` in stage")]
    DuplicateExport(String),

    #[error("no hosted zone found for domain `{0}`; the zone must be provisioned out-of-band and registered in the lookup context")]
    ZoneNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
