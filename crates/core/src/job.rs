//! Job record and its status state machine.
//!
//! ```text
//! pending -> running -> completed
//!                   \
//!                    -> failed
//! ```
//!
//! Both terminal states are absorbing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::outcome::JobOutcome;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a [`Job`]. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `true` for `completed` and `failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Statuses reachable from `self` in a single step.
    pub fn valid_transitions(self) -> &'static [JobStatus] {
        match self {
            JobStatus::Pending => &[JobStatus::Running],
            JobStatus::Running => &[JobStatus::Completed, JobStatus::Failed],
            JobStatus::Completed | JobStatus::Failed => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(self, to: JobStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown job status \"{other}\" (expected pending, running, completed or failed)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One generation request tracked from submission to its terminal state.
///
/// `params` is kept verbatim for the worker but is never serialized, since it
/// carries the caller's credential.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub service_id: String,
    #[serde(skip_serializing)]
    pub params: serde_json::Value,
    pub status: JobStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Data of the most recent `status` message from the worker.
    pub progress: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

impl Job {
    /// Create a new `pending` job.
    pub fn new(id: JobId, service_id: impl Into<String>, params: serde_json::Value) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            service_id: service_id.into(),
            params,
            status: JobStatus::Pending,
            result: None,
            error: None,
            progress: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    /// Validate and apply a status change, refreshing `updated_at`.
    fn transition(&mut self, to: JobStatus) -> Result<(), CoreError> {
        if !self.status.can_transition(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.status = to;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// `pending -> running`.
    pub fn mark_running(&mut self) -> Result<(), CoreError> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(self.updated_at);
        Ok(())
    }

    /// Apply a terminal outcome. Fails if the job is already terminal, so a
    /// duplicate signal can never overwrite the first one.
    pub fn finish(&mut self, outcome: &JobOutcome) -> Result<(), CoreError> {
        match outcome {
            JobOutcome::Completed(result) => {
                self.transition(JobStatus::Completed)?;
                self.result = Some(result.clone());
            }
            JobOutcome::Failed(error) => {
                self.transition(JobStatus::Failed)?;
                self.error = Some(error.clone());
            }
        }
        self.finished_at = Some(self.updated_at);
        Ok(())
    }

    /// Record an informational `status` message. No status change.
    pub fn record_progress(&mut self, data: serde_json::Value) {
        self.progress = Some(data);
        self.updated_at = chrono::Utc::now();
    }
}
