//! Catalog introspection for one schema.

use crate::error::DbError;
use model::{
    core::data_type::DataType,
    schema::{column::ColumnDescriptor, foreign_key::ForeignKeyDescriptor, table::TableDescriptor},
};
use tokio_postgres::{Client, Row};

const QUERY_LIST_TABLES_SQL: &str = include_str!("sql/list_tables.sql");
const QUERY_TABLE_EXISTS_SQL: &str = include_str!("sql/table_exists.sql");
const QUERY_TABLE_COLUMNS_SQL: &str = include_str!("sql/table_columns.sql");
const QUERY_TABLE_PRIMARY_KEY_SQL: &str = include_str!("sql/table_primary_key.sql");
const QUERY_TABLE_UNIQUE_KEYS_SQL: &str = include_str!("sql/table_unique_keys.sql");
const QUERY_TABLE_FOREIGN_KEYS_SQL: &str = include_str!("sql/table_foreign_keys.sql");

pub async fn list_tables(client: &Client, schema: &str) -> Result<Vec<String>, DbError> {
    let rows = client.query(QUERY_LIST_TABLES_SQL, &[&schema]).await?;
    rows.iter()
        .map(|row| row.try_get::<_, String>("table_name").map_err(DbError::from))
        .collect()
}

pub async fn table_metadata(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<TableDescriptor, DbError> {
    let exists: bool = client
        .query_one(QUERY_TABLE_EXISTS_SQL, &[&schema, &table])
        .await?
        .try_get(0)?;
    if !exists {
        return Err(DbError::TableNotFound(format!("{schema}.{table}")));
    }

    let mut descriptor = TableDescriptor::new(table);

    for row in client
        .query(QUERY_TABLE_COLUMNS_SQL, &[&schema, &table])
        .await?
    {
        descriptor = descriptor.column(column_from_row(&row)?);
    }

    descriptor.primary_key = client
        .query(QUERY_TABLE_PRIMARY_KEY_SQL, &[&schema, &table])
        .await?
        .iter()
        .map(|row| row.try_get::<_, String>("column_name"))
        .collect::<Result<Vec<_>, _>>()?;

    descriptor.unique_keys = client
        .query(QUERY_TABLE_UNIQUE_KEYS_SQL, &[&schema, &table])
        .await?
        .iter()
        .map(|row| row.try_get::<_, Vec<String>>("columns"))
        .collect::<Result<Vec<_>, _>>()?;

    for row in client
        .query(QUERY_TABLE_FOREIGN_KEYS_SQL, &[&schema, &table])
        .await?
    {
        descriptor = descriptor.foreign_key(foreign_key_from_row(&row, schema)?);
    }

    Ok(descriptor)
}

fn column_from_row(row: &Row) -> Result<ColumnDescriptor, DbError> {
    let name: String = row.try_get("column_name")?;
    let type_name: String = row.try_get("data_type")?;
    let nullable: bool = row.try_get("is_nullable")?;
    let default: Option<String> = row.try_get("column_default")?;
    let is_identity: bool = row.try_get("is_identity")?;

    Ok(describe_column(
        name,
        &type_name,
        nullable,
        default,
        is_identity,
    ))
}

/// Sequence-backed columns (`serial` or identity) are carried as identity
/// columns without their `nextval(...)` default, which names a source-side
/// sequence that will not exist on the destination.
pub(crate) fn describe_column(
    name: String,
    type_name: &str,
    nullable: bool,
    default: Option<String>,
    is_identity: bool,
) -> ColumnDescriptor {
    let data_type = DataType::from_postgres_type(type_name);
    let sequence_default = default
        .as_deref()
        .is_some_and(|d| d.trim_start().starts_with("nextval("));

    let mut column = ColumnDescriptor::new(name, data_type);
    column.nullable = nullable;

    if (is_identity || sequence_default) && column.data_type.is_integral() {
        column.identity = true;
    } else if !sequence_default {
        column.default = default;
    }
    column
}

fn foreign_key_from_row(row: &Row, schema: &str) -> Result<ForeignKeyDescriptor, DbError> {
    let name: String = row.try_get("constraint_name")?;
    let referenced_schema: String = row.try_get("referenced_schema")?;
    let referenced_table: String = row.try_get("referenced_table")?;
    let columns: Vec<String> = row.try_get("columns")?;
    let referenced_columns: Vec<String> = row.try_get("referenced_columns")?;

    // Targets outside the replicated schema keep their qualifier so the
    // reflector can report them as dangling.
    let referenced_table = if referenced_schema == schema {
        referenced_table
    } else {
        format!("{referenced_schema}.{referenced_table}")
    };

    Ok(ForeignKeyDescriptor {
        name: Some(name),
        columns,
        referenced_table,
        referenced_columns,
    })
}
