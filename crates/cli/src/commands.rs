use crate::error::CliError;
use clap::{Args, Subcommand};
use engine_config::{
    env::EnvManager,
    replication::{DEFAULT_DEST_PREFIX, DEFAULT_SOURCE_PREFIX, ReplicationConfig},
};
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Drop, recreate and repopulate every destination table from the source
    Replicate {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(
            long,
            help = "If specified, writes the JSON run report to this file instead of stdout"
        )]
        report: Option<PathBuf>,
    },
    /// Connect to both endpoints and run a liveness probe
    TestConn {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Reflect the source schema and print it together with its load order
    Inspect {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(
            long,
            help = "If specified, writes the schema JSON to this file instead of stdout"
        )]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(long, help = "JSON config file; when omitted, endpoints are read from the environment")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Additional .env file merged over the process environment")]
    pub env_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_SOURCE_PREFIX, help = "Env var prefix of the source endpoint")]
    pub source_prefix: String,

    #[arg(long, default_value = DEFAULT_DEST_PREFIX, help = "Env var prefix of the destination endpoint")]
    pub dest_prefix: String,

    #[arg(long, help = "Schema to replicate (defaults to public)")]
    pub schema: Option<String>,

    #[arg(long, help = "Rows per INSERT statement")]
    pub batch_size: Option<usize>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<ReplicationConfig, CliError> {
        self.load_with(EnvManager::from_process())
    }

    /// Resolves the run configuration: the JSON file if given, otherwise the
    /// environment, then command-line overrides.
    pub fn load_with(&self, mut env: EnvManager) -> Result<ReplicationConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading replication config from {}", path.display());
                ReplicationConfig::from_json_file(path)?
            }
            None => {
                if let Some(path) = &self.env_file {
                    env.load_from_file(path)?;
                }
                ReplicationConfig::from_env(&env, &self.source_prefix, &self.dest_prefix)?
            }
        };

        if let Some(schema) = &self.schema {
            config.settings.schema = schema.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.settings.batch_size = batch_size;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> ConfigArgs {
        ConfigArgs {
            config: None,
            env_file: None,
            source_prefix: DEFAULT_SOURCE_PREFIX.to_string(),
            dest_prefix: DEFAULT_DEST_PREFIX.to_string(),
            schema: None,
            batch_size: None,
        }
    }

    fn env() -> EnvManager {
        EnvManager::from_pairs([
            ("SOURCE_DB_HOST", "src.internal"),
            ("SOURCE_DB_NAME", "warehouse"),
            ("SOURCE_DB_USER", "reader"),
            ("DEST_DB_HOST", "dst.internal"),
            ("DEST_DB_NAME", "mirror"),
            ("DEST_DB_USER", "writer"),
        ])
    }

    #[test]
    fn test_load_from_env_with_overrides() {
        let mut args = args();
        args.schema = Some("analytics".to_string());
        args.batch_size = Some(250);

        let config = args.load_with(env()).unwrap();

        assert_eq!(config.source.host, "src.internal");
        assert_eq!(config.destination.database, "mirror");
        assert_eq!(config.settings.schema, "analytics");
        assert_eq!(config.settings.batch_size, 250);
    }

    #[test]
    fn test_env_file_fills_missing_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "DEST_DB_PORT=6543\nDEST_DB_REQUIRE_TLS=true").unwrap();
        let mut args = args();
        args.env_file = Some(file.path().to_path_buf());

        let config = args.load_with(env()).unwrap();

        assert_eq!(config.destination.port, 6543);
        assert!(config.destination.require_tls);
        assert!(!config.source.require_tls);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let mut args = args();
        args.batch_size = Some(0);
        assert!(matches!(args.load_with(env()), Err(CliError::Config(_))));
    }
}
