//! Error types for stack construction.

use thiserror::Error;

/// Result type alias for stack-building operations.
pub type StackResult<T> = Result<T, StackError>;

/// Errors that can occur while building or loading stack configuration.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("synthesis error: {0}")]
    Synth(#[from] bloginfra_core::SynthError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
