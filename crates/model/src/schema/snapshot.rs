use crate::schema::table::TableDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every table reflected from the source during one run, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, TableDescriptor>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous descriptor if a table with the same name was already present.
    pub fn insert(&mut self, table: TableDescriptor) -> Option<TableDescriptor> {
        self.tables.insert(table.name.clone(), table)
    }

    pub fn get(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.values()
    }
}

impl FromIterator<TableDescriptor> for SchemaSnapshot {
    fn from_iter<I: IntoIterator<Item = TableDescriptor>>(iter: I) -> Self {
        let mut snapshot = SchemaSnapshot::new();
        for table in iter {
            snapshot.insert(table);
        }
        snapshot
    }
}
