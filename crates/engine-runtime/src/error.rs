use engine_core::{
    error::ReplicationError,
    report::{Phase, RunReport},
};
use thiserror::Error;

/// A run that ended in `Failed`. Carries the report so callers can still
/// surface the per-table outcomes gathered before the failure.
#[derive(Debug, Error)]
#[error("Replication failed while {phase}: {source}")]
pub struct RunError {
    /// The phase the run was in when it failed.
    pub phase: Phase,
    #[source]
    pub source: ReplicationError,
    pub report: Box<RunReport>,
}

impl RunError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, ReplicationError::Cancelled)
    }

    pub fn into_report(self) -> RunReport {
        *self.report
    }
}
