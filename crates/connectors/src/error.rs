use std::time::Duration;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Errors happening while opening or verifying a connection.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connection settings cannot be turned into a driver config.
    #[error("Invalid connection settings: {0}")]
    InvalidConfig(String),

    /// Building the TLS connector failed.
    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    /// The driver could not connect or authenticate.
    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Connecting or probing took longer than the configured timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint refused the connection.
    #[error("Database unreachable: {0}")]
    Unreachable(String),

    /// The connection opened but the liveness probe failed.
    #[error("Liveness probe failed: {0}")]
    Probe(#[source] DbError),
}

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any SQL driver error.
    #[error("SQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A column value has no mapping to [`model::core::value::Value`].
    #[error("Cannot decode column '{column}' of type '{type_name}'")]
    Decode { column: String, type_name: String },

    /// The requested table does not exist in the configured schema.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A statement violated a key or foreign-key constraint.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A DDL statement could not be applied.
    #[error("DDL error: {0}")]
    Ddl(String),

    /// The connection is closed or the server is gone.
    #[error("Connection unavailable: {0}")]
    Unavailable(String),

    /// A call against `endpoint` got no answer within `limit`.
    #[error("No response from {endpoint} within {limit:?}")]
    Timeout { endpoint: String, limit: Duration },
}

impl DbError {
    /// Whether the call was cut short by a timeout, on either side of the wire.
    pub fn is_timeout(&self) -> bool {
        match self {
            DbError::Timeout { .. } => true,
            DbError::Postgres(err) => err.code() == Some(&SqlState::QUERY_CANCELED),
            _ => false,
        }
    }
}
