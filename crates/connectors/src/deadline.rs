//! Per-call deadlines for data sources and destinations.

use crate::{
    destination::DataDestination, error::DbError, probe::LivenessProbe, source::DataSource,
};
use async_trait::async_trait;
use model::{records::row::RowData, schema::table::TableDescriptor};
use planner::query::ast::ddl::DdlStatement;
use std::time::Duration;
use tracing::warn;

/// Wraps an endpoint so that every call fails with [`DbError::Timeout`] once
/// `limit` elapses. Server-side statement timeouts are reported the same way.
pub struct Deadline<T: ?Sized> {
    endpoint: String,
    limit: Duration,
    inner: Box<T>,
}

impl<T: ?Sized> Deadline<T> {
    pub fn new(inner: Box<T>, endpoint: impl Into<String>, limit: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            limit,
            inner,
        }
    }

    async fn bounded<R, F>(&self, call: &str, fut: F) -> Result<R, DbError>
    where
        R: Send,
        F: Future<Output = Result<R, DbError>> + Send,
    {
        let outcome = match tokio::time::timeout(self.limit, fut).await {
            Ok(Err(err)) if err.is_timeout() => Err(self.timeout()),
            Ok(outcome) => outcome,
            Err(_) => Err(self.timeout()),
        };
        if let Err(DbError::Timeout { .. }) = &outcome {
            warn!(endpoint = %self.endpoint, call, limit = ?self.limit, "Call timed out");
        }
        outcome
    }

    fn timeout(&self) -> DbError {
        DbError::Timeout {
            endpoint: self.endpoint.clone(),
            limit: self.limit,
        }
    }
}

#[async_trait]
impl<T: LivenessProbe + ?Sized> LivenessProbe for Deadline<T> {
    async fn ping(&self) -> Result<(), DbError> {
        self.bounded("ping", self.inner.ping()).await
    }
}

#[async_trait]
impl DataSource for Deadline<dyn DataSource> {
    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        self.bounded("list_tables", self.inner.list_tables()).await
    }

    async fn table_metadata(&self, table: &str) -> Result<TableDescriptor, DbError> {
        self.bounded("table_metadata", self.inner.table_metadata(table))
            .await
    }

    async fn fetch_rows(&self, table: &TableDescriptor) -> Result<Vec<RowData>, DbError> {
        self.bounded("fetch_rows", self.inner.fetch_rows(table)).await
    }
}

#[async_trait]
impl DataDestination for Deadline<dyn DataDestination> {
    async fn apply_ddl(&self, statements: &[DdlStatement]) -> Result<(), DbError> {
        self.bounded("apply_ddl", self.inner.apply_ddl(statements))
            .await
    }

    async fn write_rows(&self, table: &TableDescriptor, rows: &[RowData]) -> Result<u64, DbError> {
        self.bounded("write_rows", self.inner.write_rows(table, rows))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::database::MemoryDatabase;

    struct Stalled;

    #[async_trait]
    impl LivenessProbe for Stalled {
        async fn ping(&self) -> Result<(), DbError> {
            Ok(())
        }
    }

    #[async_trait]
    impl DataSource for Stalled {
        async fn list_tables(&self) -> Result<Vec<String>, DbError> {
            std::future::pending().await
        }

        async fn table_metadata(&self, table: &str) -> Result<TableDescriptor, DbError> {
            Err(DbError::TableNotFound(table.to_string()))
        }

        async fn fetch_rows(&self, _table: &TableDescriptor) -> Result<Vec<RowData>, DbError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_call_times_out() {
        let inner: Box<dyn DataSource> = Box::new(Stalled);
        let source = Deadline::new(inner, "memory://source", Duration::from_millis(20));

        let err = source.list_tables().await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Timeout { ref endpoint, limit }
                if endpoint == "memory://source" && limit == Duration::from_millis(20)
        ));

        // other errors pass through untouched
        let err = source.table_metadata("t").await.unwrap_err();
        assert!(matches!(err, DbError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn test_prompt_calls_pass_through() {
        let db = MemoryDatabase::new();
        let inner: Box<dyn DataSource> = Box::new(db.connect().unwrap());
        let source = Deadline::new(inner, "memory://source", Duration::from_secs(5));

        assert!(source.ping().await.is_ok());
        assert!(source.list_tables().await.unwrap().is_empty());
    }
}
