use crate::{
    destination::DataDestination,
    error::DbError,
    memory::database::{JournalEntry, MemoryTable, State},
    probe::LivenessProbe,
    source::DataSource,
};
use async_trait::async_trait;
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
    schema::{column::ColumnDescriptor, foreign_key::ForeignKeyDescriptor, table::TableDescriptor},
};
use parking_lot::Mutex;
use planner::query::ast::{
    create_table::{CreateTable, TableConstraint},
    ddl::DdlStatement,
    expr::Expr,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

/// A live handle onto a [`MemoryDatabase`](crate::memory::database::MemoryDatabase).
/// Dropping it releases the connection.
#[derive(Debug)]
pub struct MemoryConnection {
    state: Arc<Mutex<State>>,
}

impl MemoryConnection {
    pub(crate) fn new(state: Arc<Mutex<State>>) -> Self {
        Self { state }
    }

    fn check_reachable(state: &State) -> Result<(), DbError> {
        if state.unreachable {
            return Err(DbError::Unavailable(
                "in-memory database is offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_connections = state.open_connections.saturating_sub(1);
    }
}

#[async_trait]
impl LivenessProbe for MemoryConnection {
    async fn ping(&self) -> Result<(), DbError> {
        Self::check_reachable(&self.state.lock())
    }
}

#[async_trait]
impl DataSource for MemoryConnection {
    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let state = self.state.lock();
        Self::check_reachable(&state)?;
        Ok(state.tables.keys().cloned().collect())
    }

    async fn table_metadata(&self, table: &str) -> Result<TableDescriptor, DbError> {
        let state = self.state.lock();
        Self::check_reachable(&state)?;
        state
            .tables
            .get(table)
            .map(|t| t.descriptor.clone())
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))
    }

    async fn fetch_rows(&self, table: &TableDescriptor) -> Result<Vec<RowData>, DbError> {
        let state = self.state.lock();
        Self::check_reachable(&state)?;
        let stored = state
            .tables
            .get(&table.name)
            .ok_or_else(|| DbError::TableNotFound(table.name.clone()))?;

        Ok(stored
            .rows
            .iter()
            .map(|row| project(row, table))
            .collect())
    }
}

#[async_trait]
impl DataDestination for MemoryConnection {
    async fn apply_ddl(&self, statements: &[DdlStatement]) -> Result<(), DbError> {
        let mut state = self.state.lock();
        Self::check_reachable(&state)?;

        let fail_ddl = state.fail_ddl;
        let mut tables = state.tables.clone();
        let mut entries = Vec::with_capacity(statements.len());
        let result = statements.iter().enumerate().try_for_each(|(i, statement)| {
            if fail_ddl && i > 0 {
                return Err(DbError::Ddl(format!(
                    "injected failure at statement {} ({})",
                    i + 1,
                    statement.table()
                )));
            }
            apply_statement(&mut tables, statement)?;
            entries.push(match statement {
                DdlStatement::Drop(drop) => JournalEntry::Drop(drop.table.name.clone()),
                DdlStatement::Create(create) => JournalEntry::Create(create.table.name.clone()),
            });
            Ok(())
        });

        match result {
            Ok(()) => {
                state.tables = tables;
                state.journal.extend(entries);
                state.journal.push(JournalEntry::Commit);
                Ok(())
            }
            Err(err) => {
                state.journal.push(JournalEntry::Rollback);
                Err(err)
            }
        }
    }

    async fn write_rows(&self, table: &TableDescriptor, rows: &[RowData]) -> Result<u64, DbError> {
        let mut state = self.state.lock();
        Self::check_reachable(&state)?;

        if state.failing_writes.contains(&table.name) {
            state.journal.push(JournalEntry::Rollback);
            return Err(DbError::Constraint(format!(
                "injected failure writing to '{}'",
                table.name
            )));
        }

        match insert_checked(&state.tables, &table.name, rows) {
            Ok(accepted) => {
                let count = accepted.len();
                if let Some(stored) = state.tables.get_mut(&table.name) {
                    stored.rows.extend(accepted);
                }
                state.journal.push(JournalEntry::Insert {
                    table: table.name.clone(),
                    rows: count,
                });
                state.journal.push(JournalEntry::Commit);
                debug!(table = %table.name, rows = count, "In-memory insert committed");
                Ok(count as u64)
            }
            Err(err) => {
                state.journal.push(JournalEntry::Rollback);
                Err(err)
            }
        }
    }
}

/// Reorders a stored row into the descriptor's column order; missing fields read as `NULL`.
fn project(row: &RowData, table: &TableDescriptor) -> RowData {
    let fields = table
        .columns
        .iter()
        .map(|col| FieldValue::new(col.name.clone(), row.get_value(&col.name)))
        .collect();
    RowData::new(&table.name, fields)
}

fn apply_statement(
    tables: &mut BTreeMap<String, MemoryTable>,
    statement: &DdlStatement,
) -> Result<(), DbError> {
    match statement {
        DdlStatement::Drop(drop) => {
            let name = &drop.table.name;
            if !tables.contains_key(name) {
                if drop.if_exists {
                    return Ok(());
                }
                return Err(DbError::Ddl(format!("table '{name}' does not exist")));
            }
            if let Some(dependent) = tables.values().find(|t| {
                t.descriptor.name != *name
                    && t.descriptor
                        .foreign_keys
                        .iter()
                        .any(|fk| fk.referenced_table == *name)
            }) {
                return Err(DbError::Ddl(format!(
                    "cannot drop '{name}': referenced by '{}'",
                    dependent.descriptor.name
                )));
            }
            tables.remove(name);
            Ok(())
        }
        DdlStatement::Create(create) => {
            let descriptor = descriptor_from_create(create);
            if tables.contains_key(&descriptor.name) {
                if create.if_not_exists {
                    return Ok(());
                }
                return Err(DbError::Ddl(format!(
                    "table '{}' already exists",
                    descriptor.name
                )));
            }
            for fk in &descriptor.foreign_keys {
                let referenced = if fk.referenced_table == descriptor.name {
                    Some(&descriptor)
                } else {
                    tables.get(&fk.referenced_table).map(|t| &t.descriptor)
                };
                let Some(referenced) = referenced else {
                    return Err(DbError::Ddl(format!(
                        "'{}' references missing table '{}'",
                        descriptor.name, fk.referenced_table
                    )));
                };
                if !referenced.is_unique_key(&fk.referenced_columns) {
                    return Err(DbError::Ddl(format!(
                        "there is no unique constraint matching given keys for referenced table '{}'",
                        fk.referenced_table
                    )));
                }
            }
            tables.insert(
                descriptor.name.clone(),
                MemoryTable {
                    descriptor,
                    rows: Vec::new(),
                },
            );
            Ok(())
        }
    }
}

fn descriptor_from_create(create: &CreateTable) -> TableDescriptor {
    let mut descriptor = TableDescriptor::new(create.table.name.clone());

    for col in &create.columns {
        let mut column = ColumnDescriptor::new(col.name.clone(), col.data_type.clone());
        column.nullable = col.is_nullable;
        column.identity = col.is_identity;
        column.default = col.default_value.as_ref().map(|expr| match expr {
            Expr::Literal(sql) => sql.clone(),
            other => format!("{other:?}"),
        });
        descriptor = descriptor.column(column);
    }

    for constraint in &create.constraints {
        match constraint {
            TableConstraint::PrimaryKey { columns } => {
                descriptor.primary_key = columns.clone();
            }
            TableConstraint::Unique { columns } => {
                descriptor.unique_keys.push(columns.clone());
            }
            TableConstraint::ForeignKey {
                name,
                columns,
                references,
                referenced_columns,
            } => {
                descriptor = descriptor.foreign_key(ForeignKeyDescriptor {
                    name: name.clone(),
                    columns: columns.clone(),
                    referenced_table: references.name.clone(),
                    referenced_columns: referenced_columns.clone(),
                });
            }
        }
    }

    descriptor
}

/// Validates `rows` against the stored table and returns them projected onto
/// its columns. Nothing is written here.
fn insert_checked(
    tables: &BTreeMap<String, MemoryTable>,
    table: &str,
    rows: &[RowData],
) -> Result<Vec<RowData>, DbError> {
    let target = tables
        .get(table)
        .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
    let descriptor = &target.descriptor;

    let mut accepted: Vec<RowData> = Vec::with_capacity(rows.len());
    for row in rows {
        let row = project(row, descriptor);

        let missing = descriptor.columns.iter().find(|c| {
            !c.nullable && !c.identity && c.default.is_none() && row.get_value(&c.name).is_null()
        });
        if let Some(col) = missing {
            return Err(DbError::Constraint(format!(
                "null value in column '{}' of '{table}' violates not-null constraint",
                col.name
            )));
        }

        if !descriptor.primary_key.is_empty() {
            let key = key_of(&row, &descriptor.primary_key);
            let duplicate = target
                .rows
                .iter()
                .chain(accepted.iter())
                .any(|existing| key_of(existing, &descriptor.primary_key) == key);
            if duplicate {
                return Err(DbError::Constraint(format!(
                    "duplicate key {key:?} violates primary key of '{table}'"
                )));
            }
        }

        for unique in &descriptor.unique_keys {
            let key = key_of(&row, unique);
            if key.iter().any(Value::is_null) {
                continue;
            }
            let duplicate = target
                .rows
                .iter()
                .chain(accepted.iter())
                .any(|existing| key_of(existing, unique) == key);
            if duplicate {
                return Err(DbError::Constraint(format!(
                    "duplicate key {key:?} violates unique constraint on {unique:?} of '{table}'"
                )));
            }
        }

        for fk in &descriptor.foreign_keys {
            let key = key_of(&row, &fk.columns);
            if key.iter().any(Value::is_null) {
                continue;
            }
            let parent_rows: Box<dyn Iterator<Item = &RowData> + '_> = if fk.referenced_table == table {
                Box::new(target.rows.iter().chain(accepted.iter()).chain(std::iter::once(&row)))
            } else {
                match tables.get(&fk.referenced_table) {
                    Some(parent) => Box::new(parent.rows.iter()),
                    None => Box::new(std::iter::empty()),
                }
            };
            let found = parent_rows
                .map(|parent| key_of(parent, &fk.referenced_columns))
                .any(|parent_key| parent_key == key);
            if !found {
                return Err(DbError::Constraint(format!(
                    "insert into '{table}' violates foreign key to '{}': key {key:?} not present",
                    fk.referenced_table
                )));
            }
        }

        accepted.push(row);
    }

    Ok(accepted)
}

fn key_of(row: &RowData, columns: &[String]) -> Vec<Value> {
    columns.iter().map(|c| row.get_value(c)).collect()
}
