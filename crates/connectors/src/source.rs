use crate::{error::DbError, probe::LivenessProbe};
use async_trait::async_trait;
use model::{records::row::RowData, schema::table::TableDescriptor};

/// Read side of a replication run.
#[async_trait]
pub trait DataSource: LivenessProbe {
    /// Names of every base table in the configured schema, sorted.
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;

    /// Columns, primary key and foreign keys of one table.
    async fn table_metadata(&self, table: &str) -> Result<TableDescriptor, DbError>;

    /// Every row of `table`, with fields in the descriptor's column order.
    async fn fetch_rows(&self, table: &TableDescriptor) -> Result<Vec<RowData>, DbError>;
}
