//! Provides a fluent builder for constructing `CreateTable` ASTs.

use crate::query::ast::{
    common::TableRef,
    create_table::{ColumnDef, CreateTable, TableConstraint},
    expr::Expr,
};
use model::{core::data_type::DataType, schema::table::TableDescriptor};

#[derive(Debug, Clone)]
pub struct CreateTableBuilder {
    ast: CreateTable,
}

impl CreateTableBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: CreateTable {
                table,
                ..Default::default()
            },
        }
    }

    /// Seeds a builder with every column and key of a reflected table. Unique
    /// keys precede foreign keys so that a self-reference to a unique column resolves.
    pub fn from_descriptor(table: &TableDescriptor) -> Self {
        let mut builder = Self::new(TableRef::new(&table.name));

        for col in &table.columns {
            let mut column = builder.column(&col.name, col.data_type.clone());
            if col.nullable {
                column = column.nullable();
            }
            if col.identity && col.data_type.is_integral() {
                column = column.identity();
            } else if let Some(default) = &col.default {
                column = column.default_value(Expr::Literal(default.clone()));
            }
            builder = column.add();
        }

        if !table.primary_key.is_empty() {
            builder = builder.primary_key(table.primary_key.clone());
        }

        for columns in &table.unique_keys {
            builder = builder.unique(columns.clone());
        }

        for fk in &table.foreign_keys {
            builder = builder.foreign_key(
                fk.name.clone(),
                fk.columns.clone(),
                TableRef::new(&fk.referenced_table),
                fk.referenced_columns.clone(),
            );
        }

        builder
    }

    pub fn if_not_exists(mut self) -> Self {
        self.ast.if_not_exists = true;
        self
    }

    pub fn column(self, name: &str, data_type: DataType) -> ColumnBuilder {
        ColumnBuilder::new(self, name, data_type)
    }

    pub fn primary_key(mut self, columns: Vec<String>) -> Self {
        self.ast
            .constraints
            .push(TableConstraint::PrimaryKey { columns });
        self
    }

    pub fn unique(mut self, columns: Vec<String>) -> Self {
        self.ast.constraints.push(TableConstraint::Unique { columns });
        self
    }

    pub fn foreign_key(
        mut self,
        name: Option<String>,
        columns: Vec<String>,
        references: TableRef,
        referenced_columns: Vec<String>,
    ) -> Self {
        self.ast.constraints.push(TableConstraint::ForeignKey {
            name,
            columns,
            references,
            referenced_columns,
        });
        self
    }

    pub fn build(self) -> CreateTable {
        self.ast
    }
}

pub struct ColumnBuilder {
    table_builder: CreateTableBuilder,
    column: ColumnDef,
}

impl ColumnBuilder {
    pub fn new(table_builder: CreateTableBuilder, name: &str, data_type: DataType) -> Self {
        Self {
            table_builder,
            column: ColumnDef {
                name: name.to_string(),
                data_type,
                is_nullable: false, // Columns are NOT NULL by default
                is_identity: false,
                default_value: None,
            },
        }
    }

    pub fn nullable(mut self) -> Self {
        self.column.is_nullable = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.column.is_identity = true;
        self
    }

    pub fn default_value(mut self, default_value: Expr) -> Self {
        self.column.default_value = Some(default_value);
        self
    }

    pub fn add(mut self) -> CreateTableBuilder {
        self.table_builder.ast.columns.push(self.column);
        self.table_builder
    }
}
