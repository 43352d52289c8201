//! Worker-to-supervisor message protocol.
//!
//! A worker reports over its job channel with JSON-shaped messages of the
//! form `{"type": "<kind>", "job_id": "...", ...}`:
//!
//! - `status` carries informational progress `data`.
//! - `result` carries the success payload in `data` (terminal).
//! - `error` carries a user-facing `error` string (terminal).

use serde::{Deserialize, Serialize};

use crate::outcome::JobOutcome;
use crate::types::JobId;

/// A message emitted by a worker unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerMessage {
    /// Progress milestone. Never changes the job status.
    Status {
        #[serde(alias = "jobId")]
        job_id: JobId,
        data: serde_json::Value,
    },

    /// The job succeeded.
    Result {
        #[serde(alias = "jobId")]
        job_id: JobId,
        data: serde_json::Value,
    },

    /// The job failed.
    Error {
        #[serde(alias = "jobId")]
        job_id: JobId,
        error: String,
    },
}

impl WorkerMessage {
    /// The job this message refers to.
    pub fn job_id(&self) -> JobId {
        match self {
            WorkerMessage::Status { job_id, .. }
            | WorkerMessage::Result { job_id, .. }
            | WorkerMessage::Error { job_id, .. } => *job_id,
        }
    }

    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerMessage::Status { .. } => "status",
            WorkerMessage::Result { .. } => "result",
            WorkerMessage::Error { .. } => "error",
        }
    }

    /// The terminal outcome carried by this message, if any.
    pub fn into_outcome(self) -> Option<JobOutcome> {
        match self {
            WorkerMessage::Status { .. } => None,
            WorkerMessage::Result { data, .. } => Some(JobOutcome::Completed(data)),
            WorkerMessage::Error { error, .. } => Some(JobOutcome::Failed(error)),
        }
    }
}
