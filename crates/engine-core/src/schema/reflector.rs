//! Reads the source catalog into a [`SchemaSnapshot`].

use crate::error::ReflectionError;
use connectors::source::DataSource;
use model::schema::{snapshot::SchemaSnapshot, table::TableDescriptor};
use tracing::{debug, info};

pub struct SchemaReflector<'a> {
    source: &'a dyn DataSource,
}

impl<'a> SchemaReflector<'a> {
    pub fn new(source: &'a dyn DataSource) -> Self {
        Self { source }
    }

    /// Describes every table in the source schema. Read-only; an unchanged
    /// source always yields an identical snapshot.
    pub async fn reflect(&self) -> Result<SchemaSnapshot, ReflectionError> {
        let names = self
            .source
            .list_tables()
            .await
            .map_err(ReflectionError::Enumerate)?;

        let mut snapshot = SchemaSnapshot::new();
        for name in names {
            let table = self
                .source
                .table_metadata(&name)
                .await
                .map_err(|source| ReflectionError::Table {
                    table: name.clone(),
                    source,
                })?;
            debug!(
                table = %table.name,
                columns = table.columns.len(),
                foreign_keys = table.foreign_keys.len(),
                "Reflected table"
            );
            snapshot.insert(table);
        }

        validate(&snapshot)?;
        info!(tables = snapshot.len(), "Reflected source schema");
        Ok(snapshot)
    }
}

/// Checks that every key names existing columns and that every foreign key
/// points inside the snapshot.
pub fn validate(snapshot: &SchemaSnapshot) -> Result<(), ReflectionError> {
    for table in snapshot.tables() {
        validate_table(snapshot, table)?;
    }
    Ok(())
}

fn validate_table(snapshot: &SchemaSnapshot, table: &TableDescriptor) -> Result<(), ReflectionError> {
    let key_columns = table.primary_key.iter().chain(table.unique_keys.iter().flatten());
    for column in key_columns {
        if table.find_column(column).is_none() {
            return Err(ReflectionError::UnknownColumn {
                table: table.name.clone(),
                owner: table.name.clone(),
                column: column.clone(),
            });
        }
    }

    for fk in &table.foreign_keys {
        let referenced = snapshot.get(&fk.referenced_table).ok_or_else(|| {
            ReflectionError::DanglingReference {
                table: table.name.clone(),
                referenced: fk.referenced_table.clone(),
            }
        })?;

        if fk.columns.len() != fk.referenced_columns.len() || fk.columns.is_empty() {
            return Err(ReflectionError::KeyArity {
                table: table.name.clone(),
                local: fk.columns.len(),
                referenced: fk.referenced_columns.len(),
            });
        }

        let local = fk.columns.iter().map(|c| (table, c));
        let remote = fk.referenced_columns.iter().map(|c| (referenced, c));
        if let Some((owner, column)) = local
            .chain(remote)
            .find(|(owner, column)| owner.find_column(column).is_none())
        {
            return Err(ReflectionError::UnknownColumn {
                table: table.name.clone(),
                owner: owner.name.clone(),
                column: column.clone(),
            });
        }
    }

    Ok(())
}
