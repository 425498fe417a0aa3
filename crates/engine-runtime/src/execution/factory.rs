use async_trait::async_trait;
use connectors::{
    destination::DataDestination, error::ConnectorError, memory::database::MemoryDatabase,
    source::DataSource, sql::postgres::adapter::PgAdapter,
};
use engine_config::{replication::ReplicationConfig, settings::ReplicationSettings};
use std::time::Duration;
use tracing::info;

/// Opens the two endpoints of a run. Every call hands out a fresh handle that
/// the caller owns until it is dropped.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// How the source is named in logs and errors. Never contains a password.
    fn source_endpoint(&self) -> String;

    fn destination_endpoint(&self) -> String;

    /// Upper bound for opening and probing one endpoint.
    fn connect_timeout(&self) -> Duration;

    /// Upper bound for every later call against either endpoint.
    fn statement_timeout(&self) -> Duration;

    async fn source(&self) -> Result<Box<dyn DataSource>, ConnectorError>;

    async fn destination(&self) -> Result<Box<dyn DataDestination>, ConnectorError>;
}

pub struct PgConnectionProvider {
    config: ReplicationConfig,
}

impl PgConnectionProvider {
    pub fn new(config: ReplicationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }
}

#[async_trait]
impl ConnectionProvider for PgConnectionProvider {
    fn source_endpoint(&self) -> String {
        self.config.source.masked_url()
    }

    fn destination_endpoint(&self) -> String {
        self.config.destination.masked_url()
    }

    fn connect_timeout(&self) -> Duration {
        self.config.settings.connect_timeout()
    }

    fn statement_timeout(&self) -> Duration {
        self.config.settings.statement_timeout()
    }

    async fn source(&self) -> Result<Box<dyn DataSource>, ConnectorError> {
        info!("Connecting to source {}", self.source_endpoint());
        let adapter = PgAdapter::connect(&self.config.source, &self.config.settings).await?;
        Ok(Box::new(adapter))
    }

    async fn destination(&self) -> Result<Box<dyn DataDestination>, ConnectorError> {
        info!("Connecting to destination {}", self.destination_endpoint());
        let adapter = PgAdapter::connect(&self.config.destination, &self.config.settings).await?;
        Ok(Box::new(adapter))
    }
}

/// Serves handles onto two in-process databases.
#[derive(Clone)]
pub struct MemoryConnectionProvider {
    source: MemoryDatabase,
    destination: MemoryDatabase,
    settings: ReplicationSettings,
}

impl MemoryConnectionProvider {
    pub fn new(source: MemoryDatabase, destination: MemoryDatabase) -> Self {
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

    pub fn source_db(&self) -> &MemoryDatabase {
        &self.source
    }

    pub fn destination_db(&self) -> &MemoryDatabase {
        &self.destination
    }
}

#[async_trait]
impl ConnectionProvider for MemoryConnectionProvider {
    fn source_endpoint(&self) -> String {
        "memory://source".to_string()
    }

    fn destination_endpoint(&self) -> String {
        "memory://destination".to_string()
    }

    fn connect_timeout(&self) -> Duration {
        self.settings.connect_timeout()
    }

    fn statement_timeout(&self) -> Duration {
        self.settings.statement_timeout()
    }

    async fn source(&self) -> Result<Box<dyn DataSource>, ConnectorError> {
        Ok(Box::new(self.source.connect()?))
    }

    async fn destination(&self) -> Result<Box<dyn DataDestination>, ConnectorError> {
        Ok(Box::new(self.destination.connect()?))
    }
}
