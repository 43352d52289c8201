use genflow_core::outcome::JobOutcome;
use genflow_core::types::JobId;
use tokio::sync::oneshot;

/// Message delivered to waiters when the scheduler shuts down first.
pub const SHUTDOWN_MESSAGE: &str = "Scheduler shut down";

/// Returned by [`Scheduler::submit`](crate::Scheduler::submit).
///
/// Dropping the handle does not affect the job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    rx: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub(crate) fn new(id: JobId, rx: oneshot::Receiver<JobOutcome>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Wait for the job's terminal outcome.
    pub async fn wait(self) -> JobOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| JobOutcome::Failed(SHUTDOWN_MESSAGE.to_string()))
    }
}
