//! Job lifecycle events broadcast by the scheduler.
//!
//! Events are observational only. Subscribers that lag or disappear never
//! affect scheduling.

use serde::Serialize;
use genflow_core::types::JobId;

/// A job lifecycle change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// A job was accepted and queued.
    Submitted { job_id: JobId, service_id: String },

    /// A job was admitted and its worker spawned.
    Started { job_id: JobId, service_id: String },

    /// A worker reported a progress milestone.
    Progress {
        job_id: JobId,
        data: serde_json::Value,
    },

    /// A job finished with a result.
    Completed { job_id: JobId, service_id: String },

    /// A job failed.
    Failed {
        job_id: JobId,
        service_id: String,
        /// User-facing error message.
        error: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::Submitted { job_id, .. }
            | JobEvent::Started { job_id, .. }
            | JobEvent::Progress { job_id, .. }
            | JobEvent::Completed { job_id, .. }
            | JobEvent::Failed { job_id, .. } => *job_id,
        }
    }
}
