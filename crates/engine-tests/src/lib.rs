#![allow(dead_code)]

use connectors::memory::database::MemoryDatabase;
use model::{
    core::{data_type::DataType, value::Value},
    records::row::RowData,
    schema::{column::ColumnDescriptor, foreign_key::ForeignKeyDescriptor, table::TableDescriptor},
};
use rust_decimal::Decimal;

pub mod integration;
pub mod live;
pub mod utils;

/// `dim_x`: a dimension with no foreign keys.
pub fn dim_x() -> TableDescriptor {
    TableDescriptor::new("dim_x")
        .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
        .column(ColumnDescriptor::new("label", DataType::VarChar(Some(40))).not_null())
        .primary_key(&["id"])
}

/// `fact_y`: a fact table referencing `dim_x`.
pub fn fact_y() -> TableDescriptor {
    TableDescriptor::new("fact_y")
        .column(ColumnDescriptor::new("id", DataType::Integer).not_null())
        .column(ColumnDescriptor::new("dim_x_id", DataType::Integer).not_null())
        .column(ColumnDescriptor::new(
            "amount",
            DataType::Numeric {
                precision: Some(10),
                scale: Some(2),
            },
        ))
        .primary_key(&["id"])
        .foreign_key(
            ForeignKeyDescriptor::new(&["dim_x_id"], "dim_x", &["id"]).named("fact_y_dim_x_id_fkey"),
        )
}

pub fn dim_x_rows(labels: &[&str]) -> Vec<RowData> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            RowData::from_pairs(
                "dim_x",
                [
                    ("id", Value::Int32(i as i32 + 1)),
                    ("label", Value::from(*label)),
                ],
            )
        })
        .collect()
}

/// `(dim_x_id, amount in cents)` per row; ids start at 1.
pub fn fact_y_rows(facts: &[(i32, i64)]) -> Vec<RowData> {
    facts
        .iter()
        .enumerate()
        .map(|(i, (dim, cents))| {
            RowData::from_pairs(
                "fact_y",
                [
                    ("id", Value::Int32(i as i32 + 1)),
                    ("dim_x_id", Value::Int32(*dim)),
                    ("amount", Value::Decimal(Decimal::new(*cents, 2))),
                ],
            )
        })
        .collect()
}

pub const DIM_X_LABELS: [&str; 3] = ["north", "south", "west"];
pub const FACT_Y_FACTS: [(i32, i64); 5] = [(1, 1050), (1, 299), (2, 12000), (3, 5), (3, 77777)];

/// The two-table star schema: `dim_x` with 3 rows, `fact_y` with 5.
pub fn star_source() -> MemoryDatabase {
    MemoryDatabase::new()
        .with_table(dim_x(), dim_x_rows(&DIM_X_LABELS))
        .with_table(fact_y(), fact_y_rows(&FACT_Y_FACTS))
}
