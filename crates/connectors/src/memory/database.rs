use crate::{error::ConnectorError, memory::connection::MemoryConnection};
use model::{records::row::RowData, schema::table::TableDescriptor};
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// One observable step against a [`MemoryDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Drop(String),
    Create(String),
    Insert { table: String, rows: usize },
    Commit,
    Rollback,
}

#[derive(Debug, Clone)]
pub(crate) struct MemoryTable {
    pub(crate) descriptor: TableDescriptor,
    pub(crate) rows: Vec<RowData>,
}

#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) tables: BTreeMap<String, MemoryTable>,
    pub(crate) journal: Vec<JournalEntry>,
    pub(crate) failing_writes: BTreeSet<String>,
    pub(crate) fail_ddl: bool,
    pub(crate) unreachable: bool,
    pub(crate) open_connections: usize,
}

/// Shared handle onto an in-memory database. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a table without any constraint checks.
    pub fn with_table(self, descriptor: TableDescriptor, rows: Vec<RowData>) -> Self {
        self.insert_table(descriptor, rows);
        self
    }

    /// Seeds or replaces a table without any constraint checks.
    pub fn insert_table(&self, descriptor: TableDescriptor, rows: Vec<RowData>) {
        let mut state = self.state.lock();
        state
            .tables
            .insert(descriptor.name.clone(), MemoryTable { descriptor, rows });
    }

    pub fn table(&self, name: &str) -> Option<TableDescriptor> {
        self.state
            .lock()
            .tables
            .get(name)
            .map(|t| t.descriptor.clone())
    }

    pub fn rows(&self, name: &str) -> Option<Vec<RowData>> {
        self.state.lock().tables.get(name).map(|t| t.rows.clone())
    }

    pub fn row_count(&self, name: &str) -> Option<usize> {
        self.state.lock().tables.get(name).map(|t| t.rows.len())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.state.lock().tables.keys().cloned().collect()
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    /// Every subsequent `write_rows` into `table` fails with a constraint violation.
    pub fn fail_writes_to(&self, table: &str) {
        self.state.lock().failing_writes.insert(table.to_string());
    }

    /// Every subsequent `apply_ddl` fails after its first statement.
    pub fn fail_ddl(&self, fail: bool) {
        self.state.lock().fail_ddl = fail;
    }

    /// While unreachable, `connect` and every call on open connections fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Number of live [`MemoryConnection`]s.
    pub fn open_connections(&self) -> usize {
        self.state.lock().open_connections
    }

    pub fn connect(&self) -> Result<MemoryConnection, ConnectorError> {
        let mut state = self.state.lock();
        if state.unreachable {
            return Err(ConnectorError::Unreachable(
                "in-memory database is offline".to_string(),
            ));
        }
        state.open_connections += 1;
        Ok(MemoryConnection::new(Arc::clone(&self.state)))
    }
}
