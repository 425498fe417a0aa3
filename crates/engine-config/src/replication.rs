use crate::{
    connection::ConnectionConfig, env::EnvManager, error::ConfigError,
    settings::ReplicationSettings,
};
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

pub const DEFAULT_SOURCE_PREFIX: &str = "SOURCE_DB";
pub const DEFAULT_DEST_PREFIX: &str = "DEST_DB";

/// Everything one replication run needs: both endpoints plus run settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicationConfig {
    pub source: ConnectionConfig,
    pub destination: ConnectionConfig,
    #[serde(default)]
    pub settings: ReplicationSettings,
}

impl ReplicationConfig {
    pub fn new(source: ConnectionConfig, destination: ConnectionConfig) -> Self {
        Self {
            source,
            destination,
            settings: ReplicationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ReplicationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        info!(path = %path.display(), "Loaded replication config");
        Ok(config)
    }

    /// Reads both endpoints from prefixed environment variables, see
    /// [`ConnectionConfig::from_env`]. Settings keep their defaults.
    pub fn from_env(
        env: &EnvManager,
        source_prefix: &str,
        dest_prefix: &str,
    ) -> Result<Self, ConfigError> {
        let source = ConnectionConfig::from_env(env, source_prefix)?;
        let destination = ConnectionConfig::from_env(env, dest_prefix)?;
        let config = Self::new(source, destination);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate()?;
        self.destination.validate()?;
        self.settings.validate()
    }
}
