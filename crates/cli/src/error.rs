use engine_config::error::ConfigError;
use engine_core::error::ReplicationError;
use engine_runtime::error::RunError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to write output file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// A run that reached `Failed`.
    #[error("{0}")]
    Run(Box<RunError>),

    /// A connection probe or reflection outside a full run failed.
    #[error("{0}")]
    Replication(#[from] ReplicationError),
}

impl CliError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            CliError::Run(err) => err.is_cancelled(),
            CliError::Replication(err) => matches!(err, ReplicationError::Cancelled),
            _ => false,
        }
    }
}

impl From<RunError> for CliError {
    fn from(err: RunError) -> Self {
        CliError::Run(Box::new(err))
    }
}
