//! Replaces the destination schema with the reflected one.

use connectors::{destination::DataDestination, error::DbError};
use model::schema::{load_order::LoadOrder, snapshot::SchemaSnapshot};
use planner::query::{
    ast::{common::TableRef, ddl::DdlStatement},
    builder::{create_table::CreateTableBuilder, drop_table::DropTableBuilder},
};
use tracing::info;

/// The DDL for one materialization: drops in reverse load order, then creates
/// in load order.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializationPlan {
    drops: Vec<DdlStatement>,
    creates: Vec<DdlStatement>,
}

impl MaterializationPlan {
    /// Tables named in `order` but missing from `snapshot` are skipped.
    pub fn build(snapshot: &SchemaSnapshot, order: &LoadOrder) -> Self {
        let drops = order
            .reversed()
            .map(|name| {
                DdlStatement::Drop(DropTableBuilder::new(TableRef::new(name)).if_exists().build())
            })
            .collect();

        let creates = order
            .iter()
            .filter_map(|name| snapshot.get(name))
            .map(|table| DdlStatement::Create(CreateTableBuilder::from_descriptor(table).build()))
            .collect();

        Self { drops, creates }
    }

    pub fn drop_order(&self) -> Vec<&str> {
        self.drops.iter().map(DdlStatement::table).collect()
    }

    pub fn create_order(&self) -> Vec<&str> {
        self.creates.iter().map(DdlStatement::table).collect()
    }

    /// Drops followed by creates, as applied.
    pub fn statements(&self) -> Vec<DdlStatement> {
        self.drops.iter().chain(&self.creates).cloned().collect()
    }
}

pub struct SchemaMaterializer<'a> {
    destination: &'a dyn DataDestination,
}

impl<'a> SchemaMaterializer<'a> {
    pub fn new(destination: &'a dyn DataDestination) -> Self {
        Self { destination }
    }

    /// Drops and recreates every table in one transaction. On error the
    /// destination is left as it was.
    pub async fn materialize(
        &self,
        snapshot: &SchemaSnapshot,
        order: &LoadOrder,
    ) -> Result<MaterializationPlan, DbError> {
        let plan = MaterializationPlan::build(snapshot, order);
        info!(
            drops = plan.drops.len(),
            creates = plan.creates.len(),
            "Materializing destination schema"
        );
        self.destination.apply_ddl(&plan.statements()).await?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::database::{JournalEntry, MemoryDatabase};
    use model::{
        core::{data_type::DataType, value::Value},
        records::row::RowData,
        schema::{
            column::ColumnDescriptor, foreign_key::ForeignKeyDescriptor, table::TableDescriptor,
        },
    };
    use planner::order::load_order;

    fn snapshot() -> SchemaSnapshot {
        let id = || ColumnDescriptor::new("id", DataType::Integer).not_null();
        [
            TableDescriptor::new("dim_a").column(id()).primary_key(&["id"]),
            TableDescriptor::new("dim_b").column(id()).primary_key(&["id"]),
            TableDescriptor::new("fact")
                .column(id())
                .column(ColumnDescriptor::new("a_id", DataType::Integer))
                .column(ColumnDescriptor::new("b_id", DataType::Integer))
                .foreign_key(ForeignKeyDescriptor::new(&["a_id"], "dim_a", &["id"]))
                .foreign_key(ForeignKeyDescriptor::new(&["b_id"], "dim_b", &["id"])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_drop_order_is_reverse_of_create_order() {
        let snapshot = snapshot();
        let order = load_order(snapshot.tables()).unwrap();
        let plan = MaterializationPlan::build(&snapshot, &order);

        let mut creates = plan.create_order();
        assert_eq!(creates, vec!["dim_a", "dim_b", "fact"]);
        creates.reverse();
        assert_eq!(plan.drop_order(), creates);
    }

    #[tokio::test]
    async fn test_materialize_replaces_existing_tables() {
        let snapshot = snapshot();
        let order = load_order(snapshot.tables()).unwrap();
        let stale = TableDescriptor::new("dim_a")
            .column(ColumnDescriptor::new("legacy", DataType::Text));
        let db = MemoryDatabase::new().with_table(
            stale,
            vec![RowData::from_pairs("dim_a", [("legacy", Value::from("old"))])],
        );
        let conn = db.connect().unwrap();

        SchemaMaterializer::new(&conn)
            .materialize(&snapshot, &order)
            .await
            .unwrap();

        assert_eq!(db.table_names(), vec!["dim_a", "dim_b", "fact"]);
        assert_eq!(db.table("dim_a").unwrap(), *snapshot.get("dim_a").unwrap());
        assert_eq!(db.row_count("dim_a"), Some(0));
        assert_eq!(
            db.journal(),
            vec![
                JournalEntry::Drop("fact".to_string()),
                JournalEntry::Drop("dim_b".to_string()),
                JournalEntry::Drop("dim_a".to_string()),
                JournalEntry::Create("dim_a".to_string()),
                JournalEntry::Create("dim_b".to_string()),
                JournalEntry::Create("fact".to_string()),
                JournalEntry::Commit,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_ddl_leaves_destination_untouched() {
        let snapshot = snapshot();
        let order = load_order(snapshot.tables()).unwrap();
        let existing = TableDescriptor::new("dim_b");
        let db = MemoryDatabase::new().with_table(existing.clone(), vec![]);
        db.fail_ddl(true);
        let conn = db.connect().unwrap();

        let result = SchemaMaterializer::new(&conn)
            .materialize(&snapshot, &order)
            .await;

        assert!(result.is_err());
        assert_eq!(db.table_names(), vec!["dim_b"]);
        assert_eq!(db.table("dim_b"), Some(existing));
        assert_eq!(db.journal(), vec![JournalEntry::Rollback]);
    }
}
