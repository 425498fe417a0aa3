//! Table-by-table row transfer in load order.

use crate::{error::ReplicationError, report::CopyResult};
use connectors::{destination::DataDestination, error::DbError, source::DataSource};
use model::schema::{load_order::LoadOrder, snapshot::SchemaSnapshot, table::TableDescriptor};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct RowCopier<'a> {
    source: &'a dyn DataSource,
    destination: &'a dyn DataDestination,
    cancel: CancellationToken,
}

impl<'a> RowCopier<'a> {
    pub fn new(
        source: &'a dyn DataSource,
        destination: &'a dyn DataDestination,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            destination,
            cancel,
        }
    }

    /// Copies every table in `order`, one at a time, pushing one result per
    /// attempted table into `results`. Stops at the first failed table.
    pub async fn copy_all(
        &self,
        snapshot: &SchemaSnapshot,
        order: &LoadOrder,
        results: &mut Vec<CopyResult>,
    ) -> Result<(), ReplicationError> {
        let total = order.len();
        for (idx, name) in order.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    "Shutdown requested before copying table {}/{}: {}",
                    idx + 1,
                    total,
                    name
                );
                return Err(ReplicationError::Cancelled);
            }

            let Some(table) = snapshot.get(name) else {
                let err = DbError::TableNotFound(name.to_string());
                results.push(CopyResult::failed(name, 0, &err));
                return Err(ReplicationError::CopyFailed {
                    table: name.to_string(),
                    source: err,
                });
            };

            info!("Copying table {}/{}: {}", idx + 1, total, name);
            let result = self.copy_table(table).await;
            match result {
                Ok(copied) => results.push(copied),
                Err((failed, source)) => {
                    error!(table = %name, error = %source, "Table copy failed, halting");
                    results.push(failed);
                    return Err(ReplicationError::CopyFailed {
                        table: name.to_string(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// Reads all rows of `table` and writes them in one destination transaction.
    pub async fn copy_table(
        &self,
        table: &TableDescriptor,
    ) -> Result<CopyResult, (CopyResult, DbError)> {
        let rows = match self.source.fetch_rows(table).await {
            Ok(rows) => rows,
            Err(err) => return Err((CopyResult::failed(&table.name, 0, &err), err)),
        };

        if rows.is_empty() {
            warn!(table = %table.name, "Source table is empty, skipping");
            return Ok(CopyResult::skipped_empty(&table.name));
        }

        let attempted = rows.len() as u64;
        match self.destination.write_rows(table, &rows).await {
            Ok(committed) => {
                info!(table = %table.name, rows = committed, "Table copied");
                Ok(CopyResult::ok(&table.name, attempted, committed))
            }
            Err(err) => Err((CopyResult::failed(&table.name, attempted, &err), err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CopyStatus;
    use connectors::memory::database::{JournalEntry, MemoryDatabase};
    use model::{
        core::{data_type::DataType, value::Value},
        records::row::RowData,
        schema::{column::ColumnDescriptor, foreign_key::ForeignKeyDescriptor},
    };
    use planner::order::load_order;

    fn tables() -> Vec<TableDescriptor> {
        vec![
            TableDescriptor::new("a")
                .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
                .primary_key(&["id"]),
            TableDescriptor::new("b")
                .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
                .column(ColumnDescriptor::new("a_id", DataType::Integer))
                .primary_key(&["id"])
                .foreign_key(ForeignKeyDescriptor::new(&["a_id"], "a", &["id"])),
            TableDescriptor::new("c")
                .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
                .column(ColumnDescriptor::new("b_id", DataType::Integer))
                .primary_key(&["id"])
                .foreign_key(ForeignKeyDescriptor::new(&["b_id"], "b", &["id"])),
        ]
    }

    fn rows(table: &str, parent: Option<&str>, n: i32) -> Vec<RowData> {
        (1..=n)
            .map(|i| {
                let mut pairs = vec![("id".to_string(), Value::Int32(i))];
                if let Some(parent) = parent {
                    pairs.push((format!("{parent}_id"), Value::Int32(1)));
                }
                RowData::from_pairs(table, pairs)
            })
            .collect()
    }

    struct Fixture {
        source: MemoryDatabase,
        dest: MemoryDatabase,
        snapshot: SchemaSnapshot,
        order: LoadOrder,
    }

    fn fixture(a_rows: i32, b_rows: i32, c_rows: i32) -> Fixture {
        let tables = tables();
        let source = MemoryDatabase::new()
            .with_table(tables[0].clone(), rows("a", None, a_rows))
            .with_table(tables[1].clone(), rows("b", Some("a"), b_rows))
            .with_table(tables[2].clone(), rows("c", Some("b"), c_rows));
        let dest = MemoryDatabase::new()
            .with_table(tables[0].clone(), vec![])
            .with_table(tables[1].clone(), vec![])
            .with_table(tables[2].clone(), vec![]);
        let order = load_order(&tables).unwrap();
        let snapshot = tables.into_iter().collect();
        Fixture {
            source,
            dest,
            snapshot,
            order,
        }
    }

    #[tokio::test]
    async fn test_copies_every_table_in_order() {
        let f = fixture(2, 3, 4);
        let (src, dst) = (f.source.connect().unwrap(), f.dest.connect().unwrap());
        let copier = RowCopier::new(&src, &dst, CancellationToken::new());

        let mut results = Vec::new();
        copier.copy_all(&f.snapshot, &f.order, &mut results).await.unwrap();

        let summary: Vec<(&str, u64, CopyStatus)> = results
            .iter()
            .map(|r| (r.table.as_str(), r.rows_committed, r.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a", 2, CopyStatus::Ok),
                ("b", 3, CopyStatus::Ok),
                ("c", 4, CopyStatus::Ok)
            ]
        );
        assert_eq!(f.dest.row_count("c"), Some(4));
    }

    #[tokio::test]
    async fn test_empty_table_is_skipped() {
        let f = fixture(2, 0, 0);
        let (src, dst) = (f.source.connect().unwrap(), f.dest.connect().unwrap());
        let copier = RowCopier::new(&src, &dst, CancellationToken::new());

        let mut results = Vec::new();
        copier.copy_all(&f.snapshot, &f.order, &mut results).await.unwrap();

        assert_eq!(results[1], CopyResult::skipped_empty("b"));
        assert_eq!(results[2], CopyResult::skipped_empty("c"));
    }

    #[tokio::test]
    async fn test_failure_halts_later_tables() {
        let f = fixture(2, 3, 4);
        f.dest.fail_writes_to("b");
        let (src, dst) = (f.source.connect().unwrap(), f.dest.connect().unwrap());
        let copier = RowCopier::new(&src, &dst, CancellationToken::new());

        let mut results = Vec::new();
        let err = copier
            .copy_all(&f.snapshot, &f.order, &mut results)
            .await
            .unwrap_err();

        assert!(matches!(err, ReplicationError::CopyFailed { ref table, .. } if table == "b"));
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status, CopyStatus::Failed);
        assert_eq!(results[1].rows_attempted, 3);
        assert_eq!(results[1].rows_committed, 0);
        assert_eq!(f.dest.row_count("b"), Some(0));
        assert_eq!(f.dest.row_count("c"), Some(0));
        assert_eq!(f.dest.journal().last(), Some(&JournalEntry::Rollback));
    }

    #[tokio::test]
    async fn test_cancellation_between_tables() {
        let f = fixture(2, 3, 4);
        let (src, dst) = (f.source.connect().unwrap(), f.dest.connect().unwrap());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let copier = RowCopier::new(&src, &dst, cancel);

        let mut results = Vec::new();
        let err = copier
            .copy_all(&f.snapshot, &f.order, &mut results)
            .await
            .unwrap_err();

        assert!(matches!(err, ReplicationError::Cancelled));
        assert!(results.is_empty());
    }
}
