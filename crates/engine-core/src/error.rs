use connectors::error::{ConnectorError, DbError};
use planner::order::OrderError;
use thiserror::Error;

/// The source schema cannot be read or is not self-consistent.
#[derive(Debug, Error)]
pub enum ReflectionError {
    #[error("Failed to enumerate source tables: {0}")]
    Enumerate(#[source] DbError),

    #[error("Failed to introspect table '{table}': {source}")]
    Table {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("Table '{table}' references '{referenced}', which is not part of the reflected schema")]
    DanglingReference { table: String, referenced: String },

    #[error("Foreign key on '{table}' names column '{column}', which '{owner}' does not have")]
    UnknownColumn {
        table: String,
        owner: String,
        column: String,
    },

    #[error("Foreign key on '{table}' pairs {local} local column(s) with {referenced} referenced column(s)")]
    KeyArity {
        table: String,
        local: usize,
        referenced: usize,
    },
}

/// Every way a replication run can fail. All of them end the run.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// An endpoint cannot be reached, authenticated against, or probed in time.
    #[error("Connection to {endpoint} failed: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: ConnectorError,
    },

    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    /// No valid load order exists.
    #[error("Cyclic foreign-key dependency between tables: {}", tables.join(", "))]
    CyclicDependency { tables: Vec<String> },

    /// Dropping or creating destination tables failed; nothing was applied.
    #[error("Schema materialization failed: {0}")]
    Materialization(#[source] DbError),

    /// Transferring the rows of one table failed; its transaction was rolled back.
    #[error("Copy of table '{table}' failed: {source}")]
    CopyFailed {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("Run cancelled")]
    Cancelled,
}

impl ReplicationError {
    /// Stable, machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplicationError::Connection { .. } => "connection_error",
            ReplicationError::Reflection(_) => "reflection_error",
            ReplicationError::CyclicDependency { .. } => "cyclic_dependency_error",
            ReplicationError::Materialization(_) => "materialization_error",
            ReplicationError::CopyFailed { .. } => "copy_failed",
            ReplicationError::Cancelled => "cancelled",
        }
    }

    /// The table the failure is attributed to, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            ReplicationError::CopyFailed { table, .. } => Some(table),
            ReplicationError::Reflection(ReflectionError::Table { table, .. })
            | ReplicationError::Reflection(ReflectionError::DanglingReference { table, .. })
            | ReplicationError::Reflection(ReflectionError::UnknownColumn { table, .. })
            | ReplicationError::Reflection(ReflectionError::KeyArity { table, .. }) => Some(table),
            _ => None,
        }
    }
}

impl From<OrderError> for ReplicationError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Cycle { tables } => ReplicationError::CyclicDependency { tables },
            OrderError::UnknownTable { table, referenced } => {
                ReplicationError::Reflection(ReflectionError::DanglingReference { table, referenced })
            }
        }
    }
}
