//! Provides a fluent builder for constructing `Insert` ASTs.

use crate::query::ast::{common::TableRef, expr::Expr, insert::Insert};
use model::{records::row::RowData, schema::table::TableDescriptor};

#[derive(Debug, Clone)]
pub struct InsertBuilder {
    ast: Insert,
}

impl InsertBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Insert {
                table,
                ..Default::default()
            },
        }
    }

    /// Builds a multi-row insert of `rows` into `table`, covering every column of
    /// the descriptor in declaration order. Fields missing from a row insert `NULL`.
    /// Values for text-encoded columns are cast back to the column type.
    pub fn for_rows(table: &TableDescriptor, rows: &[RowData]) -> Insert {
        let mut builder = Self::new(TableRef::new(&table.name));
        builder.ast.columns = table.column_names();

        for row in rows {
            let values = table
                .columns
                .iter()
                .map(|col| {
                    let value = Expr::Value(row.get_value(&col.name));
                    if col.data_type.is_text_encoded() {
                        value.cast("text").cast(&col.data_type.postgres_name())
                    } else {
                        value
                    }
                })
                .collect();
            builder = builder.values(values);
        }

        builder.build()
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.ast.columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Adds a row of values to the insert statement.
    /// This can be called multiple times for a batch insert.
    pub fn values(mut self, values: Vec<Expr>) -> Self {
        self.ast.values.push(values);
        self
    }

    pub fn build(self) -> Insert {
        self.ast
    }
}

/// Maximum rows per statement so that `columns * rows` stays within `max_params`.
pub fn rows_per_statement(columns: usize, batch_size: usize, max_params: usize) -> usize {
    let batch_size = batch_size.max(1);
    if columns == 0 {
        return 1;
    }
    (max_params / columns).clamp(1, batch_size)
}
