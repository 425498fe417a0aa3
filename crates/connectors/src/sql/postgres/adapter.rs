use crate::{
    destination::DataDestination,
    error::{ConnectorError, DbError},
    probe::LivenessProbe,
    source::DataSource,
    sql::postgres::{
        metadata,
        params::PgParamStore,
        row::to_row_data,
        utils::{build_config, connect_client, quote_literal},
    },
};
use async_trait::async_trait;
use engine_config::{connection::ConnectionConfig, settings::ReplicationSettings};
use model::{records::row::RowData, schema::table::TableDescriptor};
use planner::query::{
    ast::ddl::DdlStatement,
    builder::{
        insert::{InsertBuilder, rows_per_statement},
        select::SelectBuilder,
    },
    dialect::{self, Dialect},
    renderer::render_to_sql,
};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tokio_postgres::{Client, Transaction, error::SqlState};
use tracing::{debug, warn};

const QUERY_RESET_IDENTITY_SQL: &str = include_str!("sql/reset_identity.sql");

/// A single Postgres session used either as the source or the destination of a run.
#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<RwLock<Client>>,
    dialect: dialect::Postgres,
    schema: String,
    batch_size: usize,
}

impl PgAdapter {
    pub async fn connect(
        conn: &ConnectionConfig,
        settings: &ReplicationSettings,
    ) -> Result<Self, ConnectorError> {
        conn.validate()
            .map_err(|e| ConnectorError::InvalidConfig(e.to_string()))?;

        let config = build_config(conn, settings);
        let client = connect_client(config).await?;
        debug!(endpoint = %conn, schema = %settings.schema, "Connected to Postgres");

        Ok(PgAdapter {
            client: Arc::new(RwLock::new(client)),
            dialect: dialect::Postgres,
            schema: settings.schema.clone(),
            batch_size: settings.batch_size,
        })
    }

    pub async fn lock_client(&self) -> RwLockWriteGuard<'_, Client> {
        self.client.write().await
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    async fn run_ddl(&self, tx: &Transaction<'_>, statements: &[DdlStatement]) -> Result<(), DbError> {
        for statement in statements {
            let (sql, _) = render_to_sql(statement, &self.dialect);
            debug!(table = statement.table(), "DDL: {}", sql);
            tx.batch_execute(&sql).await.map_err(|e| match e.code() {
                Some(code) if *code == SqlState::QUERY_CANCELED => DbError::Postgres(e),
                _ => DbError::Ddl(format!("{}: {e}", statement.table())),
            })?;
        }
        Ok(())
    }

    async fn insert_rows(
        &self,
        tx: &Transaction<'_>,
        table: &TableDescriptor,
        rows: &[RowData],
    ) -> Result<u64, DbError> {
        let chunk_size = rows_per_statement(
            table.columns.len(),
            self.batch_size,
            self.dialect.max_params(),
        );

        let mut written = 0;
        for chunk in rows.chunks(chunk_size) {
            let insert = InsertBuilder::for_rows(table, chunk);
            let (sql, params) = render_to_sql(&insert, &self.dialect);
            let bindings = PgParamStore::from_values(params);
            written += tx.execute(&sql, &bindings.as_refs()).await.map_err(classify)?;
        }

        for column in table.columns.iter().filter(|c| c.identity) {
            let sql = reset_identity_sql(&self.dialect, &table.name, &column.name);
            debug!(table = %table.name, column = %column.name, "Resetting identity");
            tx.batch_execute(&sql).await?;
        }

        Ok(written)
    }
}

/// Points the sequence behind an identity column at the highest copied value,
/// so the next generated value follows it. An empty table rewinds to the start.
fn reset_identity_sql(dialect: &dyn Dialect, table: &str, column: &str) -> String {
    let table_ident = dialect.quote_identifier(table);
    QUERY_RESET_IDENTITY_SQL
        .replace("{table_literal}", &quote_literal(&table_ident))
        .replace("{column_literal}", &quote_literal(column))
        .replace("{column}", &dialect.quote_identifier(column))
        .replace("{table}", &table_ident)
}

/// Surfaces constraint violations as such; everything else stays a driver error.
fn classify(err: tokio_postgres::Error) -> DbError {
    match err.as_db_error() {
        Some(db) if db.code().code().starts_with("23") => {
            DbError::Constraint(db.message().to_string())
        }
        _ => DbError::Postgres(err),
    }
}

async fn rollback(tx: Transaction<'_>, context: &str) {
    if let Err(err) = tx.rollback().await {
        warn!(%err, context, "Rollback failed");
    }
}

#[async_trait]
impl LivenessProbe for PgAdapter {
    async fn ping(&self) -> Result<(), DbError> {
        let client = self.client.read().await;
        if client.is_closed() {
            return Err(DbError::Unavailable("connection closed".to_string()));
        }
        let row = client.query_one("SELECT 1", &[]).await?;
        let one: i32 = row.try_get(0)?;
        debug!(result = one, "Postgres ping");
        Ok(())
    }
}

#[async_trait]
impl DataSource for PgAdapter {
    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let client = self.client.read().await;
        metadata::list_tables(&client, &self.schema).await
    }

    async fn table_metadata(&self, table: &str) -> Result<TableDescriptor, DbError> {
        let client = self.client.read().await;
        metadata::table_metadata(&client, &self.schema, table).await
    }

    async fn fetch_rows(&self, table: &TableDescriptor) -> Result<Vec<RowData>, DbError> {
        let select = SelectBuilder::full_scan(table);
        let (sql, _) = render_to_sql(&select, &self.dialect);
        debug!(table = %table.name, "Fetch: {}", sql);

        let client = self.client.read().await;
        let rows = client.query(&sql, &[]).await?;
        rows.iter()
            .map(|row| to_row_data(row, &table.name))
            .collect()
    }
}

#[async_trait]
impl DataDestination for PgAdapter {
    async fn apply_ddl(&self, statements: &[DdlStatement]) -> Result<(), DbError> {
        let mut client = self.lock_client().await;
        let tx = client.transaction().await?;

        match self.run_ddl(&tx, statements).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(err) => {
                rollback(tx, "apply_ddl").await;
                Err(err)
            }
        }
    }

    async fn write_rows(&self, table: &TableDescriptor, rows: &[RowData]) -> Result<u64, DbError> {
        let mut client = self.lock_client().await;
        let tx = client.transaction().await?;

        match self.insert_rows(&tx, table, rows).await {
            Ok(written) => {
                tx.commit().await?;
                Ok(written)
            }
            Err(err) => {
                rollback(tx, &table.name).await;
                Err(err)
            }
        }
    }
}
