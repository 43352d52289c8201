//! The seam between the supervisor and the code that performs a job.
//!
//! A [`JobRunner`] is registered per service. For every admitted job the
//! supervisor spawns an isolated task that calls [`JobRunner::run`] with the
//! job's input and a [`WorkerOutbox`]; the outbox is the only channel back
//! to the orchestrator.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::messages::WorkerMessage;
use crate::types::JobId;

/// The only input a worker unit receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInput {
    pub job_id: JobId,
    pub params: serde_json::Value,
}

/// Sending half of a job's message channel.
#[derive(Debug, Clone)]
pub struct WorkerOutbox {
    job_id: JobId,
    tx: mpsc::Sender<WorkerMessage>,
}

impl WorkerOutbox {
    pub fn new(job_id: JobId, tx: mpsc::Sender<WorkerMessage>) -> Self {
        Self { job_id, tx }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Send a raw message. Returns `false` if the supervisor has already
    /// torn the channel down.
    pub async fn send(&self, message: WorkerMessage) -> bool {
        self.tx.send(message).await.is_ok()
    }

    /// Report a progress milestone.
    pub async fn status(&self, data: serde_json::Value) -> bool {
        self.send(WorkerMessage::Status {
            job_id: self.job_id,
            data,
        })
        .await
    }

    /// Report success.
    pub async fn result(&self, data: serde_json::Value) -> bool {
        self.send(WorkerMessage::Result {
            job_id: self.job_id,
            data,
        })
        .await
    }

    /// Report failure with a user-facing message.
    pub async fn error(&self, error: impl Into<String>) -> bool {
        self.send(WorkerMessage::Error {
            job_id: self.job_id,
            error: error.into(),
        })
        .await
    }
}

/// Executes jobs for one service.
///
/// Implementations must report exactly one terminal message (`result` or
/// `error`) through the outbox. Returning or panicking without one is
/// treated by the supervisor as an abnormal worker exit.
#[async_trait::async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(&self, input: WorkerInput, outbox: WorkerOutbox);
}
