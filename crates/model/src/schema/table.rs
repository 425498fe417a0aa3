use crate::schema::{column::ColumnDescriptor, foreign_key::ForeignKeyDescriptor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    /// Column sets under a `UNIQUE` constraint or full unique index, excluding the primary key.
    #[serde(default)]
    pub unique_keys: Vec<Vec<String>>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique_keys: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.unique_keys
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether `columns`, in any order, are exactly the primary key or one unique key.
    /// Only such column sets can be the target of a foreign key.
    pub fn is_unique_key(&self, columns: &[String]) -> bool {
        let same_set = |key: &[String]| {
            key.len() == columns.len() && key.iter().all(|k| columns.contains(k))
        };
        (!self.primary_key.is_empty() && same_set(&self.primary_key))
            || self.unique_keys.iter().any(|key| same_set(key))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Distinct tables this table references, excluding itself.
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self
            .foreign_keys
            .iter()
            .map(|fk| fk.referenced_table.as_str())
            .filter(|t| *t != self.name)
            .collect();
        tables.sort_unstable();
        tables.dedup();
        tables
    }

    pub fn is_self_referencing(&self) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.referenced_table == self.name)
    }
}
