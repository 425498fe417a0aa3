use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 300;

/// Run-wide knobs shared by both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationSettings {
    /// Namespace reflected on the source and recreated on the destination.
    pub schema: String,
    /// Rows per INSERT statement.
    pub batch_size: usize,
    /// Upper bound for connecting and probing one endpoint.
    pub connect_timeout_secs: u64,
    /// Upper bound for any single catalog query, DDL batch, fetch or insert.
    /// Set as the server-side `statement_timeout` and enforced client-side as well.
    pub statement_timeout_secs: u64,
}

impl Default for ReplicationSettings {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            statement_timeout_secs: DEFAULT_STATEMENT_TIMEOUT_SECS,
        }
    }
}

impl ReplicationSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema.trim().is_empty() {
            return Err(ConfigError::Invalid("schema must not be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.statement_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "statement_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
