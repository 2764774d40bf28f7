//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Run has not started
    Pending,
    /// Run is in progress
    Running,
    /// Every unit finished
    Completed,
    /// A unit failed after exhausting its retries
    Failed,
    /// A confirmation prompt was declined
    Cancelled,
}

/// What happened to a single step in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The action ran and succeeded
    Executed { attempts: usize },
    /// The target's content matched the recorded hash
    Unchanged,
    /// The skip condition held
    Skipped,
}

/// Progress record for one pipeline or publish run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Pipeline name or repository being published
    pub name: String,

    pub status: ExecutionStatus,

    pub started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Units whose action actually ran
    pub executed: usize,

    /// Units found unchanged
    pub unchanged: usize,

    /// Units excluded by their skip condition
    pub skipped: usize,

    pub total: usize,
}

impl RunSummary {
    pub fn new(name: &str) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            name: name.to_string(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            executed: 0,
            unchanged: 0,
            skipped: 0,
            total: 0,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self, total: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total = total;
    }

    pub fn record(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Executed { .. } => self.executed += 1,
            StepOutcome::Unchanged => self.unchanged += 1,
            StepOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Units that finished without error
    pub fn completed(&self) -> usize {
        self.executed + self.unchanged + self.skipped
    }

    pub fn finish(&mut self, status: ExecutionStatus) {
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    /// Calculate progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed() as f64 / self.total as f64
    }
}
