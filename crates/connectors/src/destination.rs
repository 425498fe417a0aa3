use crate::{error::DbError, probe::LivenessProbe};
use async_trait::async_trait;
use model::{records::row::RowData, schema::table::TableDescriptor};
use planner::query::ast::ddl::DdlStatement;

/// Write side of a replication run.
#[async_trait]
pub trait DataDestination: LivenessProbe {
    /// Applies every statement in one transaction. Either all of them take
    /// effect or none do.
    async fn apply_ddl(&self, statements: &[DdlStatement]) -> Result<(), DbError>;

    /// Inserts `rows` into `table` in one transaction and returns the number
    /// of rows committed. On error nothing from this call is kept.
    async fn write_rows(&self, table: &TableDescriptor, rows: &[RowData]) -> Result<u64, DbError>;
}
