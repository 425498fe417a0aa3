//! The structured summary of one replication run.

use crate::error::ReplicationError;
use chrono::{DateTime, Utc};
use connectors::error::DbError;
use model::schema::load_order::LoadOrder;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// States of the replication pipeline, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Connecting,
    Reflecting,
    Materializing,
    Copying,
    Done,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }

    /// The state a successful step leads to.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::Connecting),
            Phase::Connecting => Some(Phase::Reflecting),
            Phase::Reflecting => Some(Phase::Materializing),
            Phase::Materializing => Some(Phase::Copying),
            Phase::Copying => Some(Phase::Done),
            Phase::Done | Phase::Failed => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Connecting => "connecting",
            Phase::Reflecting => "reflecting",
            Phase::Materializing => "materializing",
            Phase::Copying => "copying",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    Ok,
    SkippedEmpty,
    Failed,
}

/// Outcome of copying one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyResult {
    pub table: String,
    pub rows_attempted: u64,
    pub rows_committed: u64,
    pub status: CopyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CopyResult {
    pub fn ok(table: &str, rows_attempted: u64, rows_committed: u64) -> Self {
        Self {
            table: table.to_string(),
            rows_attempted,
            rows_committed,
            status: CopyStatus::Ok,
            error: None,
        }
    }

    pub fn skipped_empty(table: &str) -> Self {
        Self {
            table: table.to_string(),
            rows_attempted: 0,
            rows_committed: 0,
            status: CopyStatus::SkippedEmpty,
            error: None,
        }
    }

    /// Nothing is committed for a failed table.
    pub fn failed(table: &str, rows_attempted: u64, error: &DbError) -> Self {
        Self {
            table: table.to_string(),
            rows_attempted,
            rows_committed: 0,
            status: CopyStatus::Failed,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Done,
    Failed,
}

/// Which phase failed, on which table, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub kind: String,
    pub cause: String,
}

impl RunFailure {
    pub fn new(phase: Phase, error: &ReplicationError) -> Self {
        Self {
            phase,
            table: error.table().map(str::to_string),
            kind: error.kind().to_string(),
            cause: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    /// Every state the run entered, in order.
    pub phases: Vec<Phase>,
    pub load_order: LoadOrder,
    pub tables: Vec<CopyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Running,
            phases: vec![Phase::Idle],
            load_order: LoadOrder::default(),
            tables: Vec::new(),
            failure: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// The state the run is currently in.
    pub fn phase(&self) -> Phase {
        self.phases.last().copied().unwrap_or(Phase::Idle)
    }

    pub fn enter(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    pub fn finish_done(&mut self) {
        self.enter(Phase::Done);
        self.status = RunStatus::Done;
        self.finished_at = Some(Utc::now());
    }

    /// Records `error` against the phase the run was in and moves to `Failed`.
    pub fn finish_failed(&mut self, error: &ReplicationError) {
        let failed_in = self.phase();
        self.failure = Some(RunFailure::new(failed_in, error));
        self.enter(Phase::Failed);
        self.status = RunStatus::Failed;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_done(&self) -> bool {
        self.status == RunStatus::Done
    }

    pub fn table(&self, name: &str) -> Option<&CopyResult> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn rows_committed(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_committed).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
