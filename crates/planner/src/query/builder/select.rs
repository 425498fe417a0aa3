//! Provides a fluent builder for constructing `Select` ASTs.

use crate::query::{
    ast::{common::TableRef, expr::Expr, select::Select},
    ident,
};
use model::schema::table::TableDescriptor;

#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    ast: Select,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects every column of `table` in declaration order. Numerics and columns
    /// of types without a native client representation are read as text.
    pub fn full_scan(table: &TableDescriptor) -> Select {
        let columns = table
            .columns
            .iter()
            .map(|col| {
                if col.data_type.is_text_encoded() {
                    ident(&col.name).cast("text").alias(&col.name)
                } else {
                    ident(&col.name)
                }
            })
            .collect();

        Self::new()
            .select(columns)
            .from(TableRef::new(&table.name))
            .build()
    }

    pub fn select(mut self, columns: Vec<Expr>) -> Self {
        self.ast.columns = columns;
        self
    }

    pub fn from(mut self, table: TableRef) -> Self {
        self.ast.from = Some(table);
        self
    }

    pub fn build(self) -> Select {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{dialect::Postgres, renderer::render_to_sql};
    use model::{core::data_type::DataType, schema::column::ColumnDescriptor};

    #[test]
    fn test_full_scan_reads_custom_types_as_text() {
        let table = TableDescriptor::new("dim_x")
            .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
            .column(ColumnDescriptor::new("tags", DataType::Custom("text[]".into())));

        let (sql, _) = render_to_sql(&SelectBuilder::full_scan(&table), &Postgres);
        assert_eq!(sql, r#"SELECT "id", "tags"::text AS "tags" FROM "dim_x";"#);
    }

    #[test]
    fn test_full_scan_reads_numerics_as_text() {
        let table = TableDescriptor::new("ledger")
            .column(ColumnDescriptor::new("id", DataType::BigInt).not_null())
            .column(ColumnDescriptor::new(
                "balance",
                DataType::from_postgres_type("numeric(40,32)"),
            ))
            .column(ColumnDescriptor::new("posted_at", DataType::TimestampTz));

        let (sql, _) = render_to_sql(&SelectBuilder::full_scan(&table), &Postgres);
        assert_eq!(
            sql,
            r#"SELECT "id", "balance"::text AS "balance", "posted_at" FROM "ledger";"#
        );
    }

    #[test]
    fn test_select_without_columns_is_star() {
        let ast = SelectBuilder::new().from(TableRef::new("t")).build();
        let (sql, _) = render_to_sql(&ast, &Postgres);
        assert_eq!(sql, r#"SELECT * FROM "t";"#);
    }
}
