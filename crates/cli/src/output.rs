use crate::error::CliError;
use engine_core::{error::ReplicationError, report::RunReport, schema::reflector::SchemaReflector};
use engine_runtime::execution::{executor::open_source, factory::ConnectionProvider};
use model::schema::{load_order::LoadOrder, snapshot::SchemaSnapshot};
use planner::order::{OrderError, load_order};
use serde::Serialize;
use std::path::Path;

/// What `inspect` prints: the reflected source and how it would be loaded.
#[derive(Debug, Serialize)]
pub struct Inspection {
    pub source: String,
    pub schema: SchemaSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_order: Option<LoadOrder>,
    /// Tables on a foreign-key cycle, when no load order exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
}

pub async fn inspect(provider: &dyn ConnectionProvider) -> Result<Inspection, CliError> {
    let source = open_source(provider).await?;
    let schema = SchemaReflector::new(source.as_ref())
        .reflect()
        .await
        .map_err(ReplicationError::from)?;
    drop(source);

    let (load_order, cycle) = match load_order(schema.tables()) {
        Ok(order) => (Some(order), None),
        Err(OrderError::Cycle { tables }) => (None, Some(tables)),
        Err(err) => return Err(ReplicationError::from(err).into()),
    };

    Ok(Inspection {
        source: provider.source_endpoint(),
        schema,
        load_order,
        cycle,
    })
}

pub async fn emit<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => tokio::fs::write(path, json).await?,
        None => println!("{json}"),
    }
    Ok(())
}

pub async fn emit_report(report: &RunReport, path: Option<&Path>) -> Result<(), CliError> {
    emit(report, path).await
}
