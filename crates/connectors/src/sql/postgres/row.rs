use crate::error::DbError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use tokio_postgres::{
    Row,
    types::{FromSql, Json as PgJson},
};
use uuid::Uuid;

/// Decodes a Postgres row into `RowData`, column by column, in result order.
pub fn to_row_data(row: &Row, table: &str) -> Result<RowData, DbError> {
    let field_values = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = decode_value(row, idx, column.type_().name())?;
            Ok(FieldValue::new(column.name(), value))
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(RowData::new(table, field_values))
}

fn decode_value(row: &Row, idx: usize, type_name: &str) -> Result<Value, DbError> {
    let value = match type_name {
        "bool" => get::<bool>(row, idx, type_name)?.map(Value::Boolean),
        "int2" => get::<i16>(row, idx, type_name)?.map(Value::SmallInt),
        "int4" => get::<i32>(row, idx, type_name)?.map(Value::Int32),
        "int8" => get::<i64>(row, idx, type_name)?.map(Value::Int),
        "oid" => get::<u32>(row, idx, type_name)?.map(|v| Value::Int(i64::from(v))),
        "float4" => get::<f32>(row, idx, type_name)?.map(Value::Float32),
        "float8" => get::<f64>(row, idx, type_name)?.map(Value::Float),
        "text" | "varchar" | "bpchar" | "name" | "unknown" => {
            get::<String>(row, idx, type_name)?.map(Value::String)
        }
        "bytea" => get::<Vec<u8>>(row, idx, type_name)?.map(Value::Bytes),
        "uuid" => get::<Uuid>(row, idx, type_name)?.map(Value::Uuid),
        "json" | "jsonb" => get::<PgJson<serde_json::Value>>(row, idx, type_name)?
            .map(|json| Value::Json(json.0)),
        "date" => get::<NaiveDate>(row, idx, type_name)?.map(Value::Date),
        "time" => get::<NaiveTime>(row, idx, type_name)?.map(Value::Time),
        "timestamp" => get::<NaiveDateTime>(row, idx, type_name)?.map(Value::TimestampNaive),
        "timestamptz" => get::<DateTime<Utc>>(row, idx, type_name)?.map(Value::Timestamp),
        _ => return Err(decode_error(row, idx, type_name)),
    };

    Ok(value.unwrap_or(Value::Null))
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize, type_name: &str) -> Result<Option<T>, DbError> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|_| decode_error(row, idx, type_name))
}

fn decode_error(row: &Row, idx: usize, type_name: &str) -> DbError {
    DbError::Decode {
        column: row
            .columns()
            .get(idx)
            .map(|c| c.name().to_string())
            .unwrap_or_default(),
        type_name: type_name.to_string(),
    }
}
