use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating replication configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config or `.env` file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JSON config file is malformed.
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file line is not `KEY=VALUE`.
    #[error("Invalid env file: {0}")]
    EnvFile(String),

    /// A required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    /// An environment variable is set but cannot be parsed.
    #[error("Invalid value for {key}: {reason}")]
    InvalidVar { key: String, reason: String },

    /// A connection URL could not be parsed.
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    /// The configuration parsed but violates a constraint.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
