//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Parser timeout must be greater than zero")]
    InvalidTimeout,

    #[error("max_attempts must be greater than zero")]
    InvalidMaxAttempts,

    #[error("Terminal node ids must not be empty")]
    EmptyTerminalNode,

    #[error("Unknown step name in action overrides: {0}")]
    UnknownStepName(String),

    #[error("Unknown action kind for step '{step}': {kind}")]
    UnknownActionKind { step: String, kind: String },

    #[error("DDT directory must not be empty")]
    EmptyDdtDir,

    #[error("Invalid log filter: {0}")]
    InvalidLogLevel(String),
}
