use crate::{error::RunError, execution::factory::ConnectionProvider};
use connectors::{
    deadline::Deadline,
    destination::DataDestination,
    error::{ConnectorError, DbError},
    probe::LivenessProbe,
    source::DataSource,
};
use engine_core::{
    copier::RowCopier,
    error::{ReflectionError, ReplicationError},
    report::{Phase, RunReport},
    schema::{materializer::SchemaMaterializer, reflector::SchemaReflector},
};
use planner::order::load_order;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs one full-refresh replication pass.
pub async fn run(
    provider: &dyn ConnectionProvider,
    cancel: CancellationToken,
) -> Result<RunReport, RunError> {
    ReplicationExecutor::new(provider, cancel).execute().await
}

/// Drives a run through `Idle → Connecting → Reflecting → Materializing →
/// Copying → Done`. Any error moves it to `Failed`.
///
/// Both connections live inside [`ReplicationExecutor::drive`] and are dropped
/// before the report is finalized, whichever way the run ends.
struct ReplicationExecutor<'a> {
    provider: &'a dyn ConnectionProvider,
    cancel: CancellationToken,
    report: RunReport,
}

impl<'a> ReplicationExecutor<'a> {
    fn new(provider: &'a dyn ConnectionProvider, cancel: CancellationToken) -> Self {
        Self {
            provider,
            cancel,
            report: RunReport::new(),
        }
    }

    async fn execute(mut self) -> Result<RunReport, RunError> {
        let start_time = std::time::Instant::now();
        info!("Replication run ID: {}", self.report.run_id);

        match self.drive().await.map_err(escalate_timeout) {
            Ok(()) => {
                self.report.finish_done();
                info!(
                    "Replication completed in {:.2}s: {} table(s), {} row(s)",
                    start_time.elapsed().as_secs_f64(),
                    self.report.tables.len(),
                    self.report.rows_committed()
                );
                Ok(self.report)
            }
            Err(source) => {
                let phase = self.report.phase();
                self.report.finish_failed(&source);
                error!(phase = %phase, kind = source.kind(), "Replication failed: {}", source);
                Err(RunError {
                    phase,
                    source,
                    report: Box::new(self.report),
                })
            }
        }
    }

    async fn drive(&mut self) -> Result<(), ReplicationError> {
        self.advance(Phase::Connecting)?;
        let limit = self.provider.statement_timeout();
        let source = Deadline::new(
            open_source(self.provider).await?,
            self.provider.source_endpoint(),
            limit,
        );
        let destination = Deadline::new(
            open_destination(self.provider).await?,
            self.provider.destination_endpoint(),
            limit,
        );

        self.advance(Phase::Reflecting)?;
        let snapshot = SchemaReflector::new(&source).reflect().await?;
        let order = load_order(snapshot.tables())?;
        info!("Load order: {}", order.as_slice().join(", "));
        self.report.load_order = order.clone();

        self.advance(Phase::Materializing)?;
        SchemaMaterializer::new(&destination)
            .materialize(&snapshot, &order)
            .await
            .map_err(ReplicationError::Materialization)?;

        self.advance(Phase::Copying)?;
        RowCopier::new(&source, &destination, self.cancel.clone())
            .copy_all(&snapshot, &order, &mut self.report.tables)
            .await
    }

    /// Moves to `phase` unless shutdown was requested.
    fn advance(&mut self, phase: Phase) -> Result<(), ReplicationError> {
        if self.cancel.is_cancelled() {
            warn!("Shutdown requested before entering {} phase", phase);
            return Err(ReplicationError::Cancelled);
        }
        info!("Entering {} phase", phase);
        self.report.enter(phase);
        Ok(())
    }
}

/// Opens the source and runs its liveness probe within the provider's connect timeout.
pub async fn open_source(
    provider: &dyn ConnectionProvider,
) -> Result<Box<dyn DataSource>, ReplicationError> {
    let endpoint = provider.source_endpoint();
    within_timeout(&endpoint, provider.connect_timeout(), async {
        let source = provider.source().await?;
        source.ping().await.map_err(ConnectorError::Probe)?;
        Ok(source)
    })
    .await
}

/// Opens the destination and runs its liveness probe within the provider's connect timeout.
pub async fn open_destination(
    provider: &dyn ConnectionProvider,
) -> Result<Box<dyn DataDestination>, ReplicationError> {
    let endpoint = provider.destination_endpoint();
    within_timeout(&endpoint, provider.connect_timeout(), async {
        let destination = provider.destination().await?;
        destination.ping().await.map_err(ConnectorError::Probe)?;
        Ok(destination)
    })
    .await
}

async fn within_timeout<T, F>(
    endpoint: &str,
    limit: Duration,
    connect: F,
) -> Result<T, ReplicationError>
where
    F: Future<Output = Result<T, ConnectorError>>,
{
    let outcome = match tokio::time::timeout(limit, connect).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ConnectorError::Timeout(limit)),
    };

    outcome.map_err(|source| {
        error!(endpoint = %endpoint, error = %source, "Connection failed");
        ReplicationError::Connection {
            endpoint: endpoint.to_string(),
            source,
        }
    })
}

/// A call that ran out of time means its endpoint stopped answering, so it is
/// reported as a connection failure whichever phase it interrupted.
fn escalate_timeout(err: ReplicationError) -> ReplicationError {
    let timeout = match &err {
        ReplicationError::Reflection(ReflectionError::Enumerate(source))
        | ReplicationError::Reflection(ReflectionError::Table { source, .. })
        | ReplicationError::Materialization(source)
        | ReplicationError::CopyFailed { source, .. } => match source {
            DbError::Timeout { endpoint, limit } => Some((endpoint.clone(), *limit)),
            _ => None,
        },
        _ => None,
    };

    match timeout {
        Some((endpoint, limit)) => {
            error!(endpoint = %endpoint, error = %err, "Connection failed");
            ReplicationError::Connection {
                endpoint,
                source: ConnectorError::Timeout(limit),
            }
        }
        None => err,
    }
}
