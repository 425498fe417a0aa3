#![allow(dead_code)]

use connectors::{
    memory::database::MemoryDatabase,
    sql::postgres::utils::{build_config, connect_client},
};
use engine_config::{
    connection::ConnectionConfig, replication::ReplicationConfig, settings::ReplicationSettings,
};
use engine_core::report::RunReport;
use engine_runtime::{
    error::RunError,
    execution::{executor::run, factory::ConnectionProvider},
};
use tokio_postgres::Client;
use tokio_util::sync::CancellationToken;

/// Env vars naming the live Postgres endpoints used by the ignored tests.
pub const SOURCE_URL_VAR: &str = "DBMIRROR_TEST_SOURCE_URL";
pub const DEST_URL_VAR: &str = "DBMIRROR_TEST_DEST_URL";

/// Schema the live tests replicate. Created and dropped by the tests themselves.
pub const LIVE_SCHEMA: &str = "dbmirror_test";

pub async fn replicate(provider: &dyn ConnectionProvider) -> Result<RunReport, RunError> {
    run(provider, CancellationToken::new()).await
}

/// Asserts that `table` holds exactly the same rows, in the same order, on both sides.
pub fn assert_rows_match(source: &MemoryDatabase, dest: &MemoryDatabase, table: &str) {
    let expected = source.rows(table).expect("table missing from source");
    let actual = dest
        .rows(table)
        .unwrap_or_else(|| panic!("table '{table}' missing from destination"));
    assert_eq!(actual, expected, "rows of '{table}' differ");
}

pub fn assert_row_count(db: &MemoryDatabase, table: &str, expected: usize) {
    assert_eq!(
        db.row_count(table),
        Some(expected),
        "unexpected row count for '{table}'"
    );
}

/// Replication config for the live tests, or `None` if the env vars are unset.
pub fn live_config() -> Option<ReplicationConfig> {
    let source = std::env::var(SOURCE_URL_VAR).ok()?;
    let dest = std::env::var(DEST_URL_VAR).ok()?;
    let source = ConnectionConfig::from_url(&source).expect("invalid source url");
    let dest = ConnectionConfig::from_url(&dest).expect("invalid destination url");
    let settings = ReplicationSettings {
        schema: LIVE_SCHEMA.to_string(),
        ..ReplicationSettings::default()
    };
    Some(ReplicationConfig::new(source, dest).with_settings(settings))
}

pub async fn pg_client(conn: &ConnectionConfig, settings: &ReplicationSettings) -> Client {
    connect_client(build_config(conn, settings))
        .await
        .expect("connect postgres")
}

/// Drops and recreates the test schema so it's empty.
pub async fn reset_schema(client: &Client) {
    client
        .batch_execute(&format!(
            "DROP SCHEMA IF EXISTS {LIVE_SCHEMA} CASCADE; CREATE SCHEMA {LIVE_SCHEMA};"
        ))
        .await
        .expect("reset postgres schema");
}

/// Creates `dim_x` (3 rows) and `fact_y` (5 rows, FK to `dim_x`) in the test schema.
pub const STAR_SCHEMA_DDL: &str = r#"
    CREATE TABLE dim_x (
        id SERIAL PRIMARY KEY,
        label VARCHAR(40) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE fact_y (
        id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
        dim_x_id INTEGER NOT NULL REFERENCES dim_x (id),
        amount NUMERIC(10, 2),
        tags TEXT[],
        payload JSONB
    );
    INSERT INTO dim_x (label) VALUES ('north'), ('south'), ('west');
    INSERT INTO fact_y (dim_x_id, amount, tags, payload) VALUES
        (1, 10.50, ARRAY['a'], '{"k": 1}'),
        (1, 2.99, NULL, NULL),
        (2, 120.00, ARRAY['b', 'c'], '{"k": 2}'),
        (3, 0.05, '{}', '[]'),
        (3, 777.77, ARRAY['d'], 'null');
"#;

/// Tables whose values a lossy decoder would alter, an FK onto a UNIQUE
/// column, and a smallint identity already at its upper bound.
pub const EDGE_SCHEMA_DDL: &str = r#"
    CREATE TABLE ledger (
        id SMALLINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
        balance NUMERIC,
        tags INTEGER[],
        posted_at TIMESTAMPTZ
    );
    INSERT INTO ledger (id, balance, tags, posted_at) VALUES
        (1, 100000000000000000000000000000000, '{1,2,NULL}', '1999-12-31 23:59:59.999999-05'),
        (2, 0.12345678901234567890123456789012, '{}', NULL),
        (32767, 'NaN', NULL, '2024-02-29 12:00:00+00');
    CREATE TABLE customers (
        id INTEGER PRIMARY KEY,
        code TEXT NOT NULL UNIQUE
    );
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer_code TEXT REFERENCES customers (code)
    );
    INSERT INTO customers VALUES (1, 'ACME'), (2, 'GLOBEX');
    INSERT INTO orders VALUES (10, 'GLOBEX'), (11, NULL);
"#;

/// Every row of `query` rendered as text, for comparing both sides exactly.
pub async fn text_rows(client: &Client, query: &str) -> Vec<Vec<Option<String>>> {
    client
        .query(query, &[])
        .await
        .expect("query rows")
        .iter()
        .map(|row| (0..row.len()).map(|i| row.get(i)).collect())
        .collect()
}

pub async fn row_count(client: &Client, table: &str) -> i64 {
    client
        .query_one(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .await
        .expect("count rows")
        .get(0)
}

pub async fn table_names(client: &Client) -> Vec<String> {
    client
        .query(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = $1 ORDER BY table_name",
            &[&LIVE_SCHEMA],
        )
        .await
        .expect("list tables")
        .iter()
        .map(|row| row.get(0))
        .collect()
}
