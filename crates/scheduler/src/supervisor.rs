//! Worker supervision.
//!
//! Every admitted job gets a supervision task. It spawns the service's
//! runner in a separate worker task, connected only by a bounded message
//! channel, and relays the worker's messages into the registry until the
//! first terminal message, a timeout, an abnormal worker exit or
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use genflow_core::messages::WorkerMessage;
use genflow_core::outcome::JobOutcome;
use genflow_core::runner::{WorkerInput, WorkerOutbox};
use genflow_core::types::{JobId, Timestamp};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Service;
use crate::events::JobEvent;
use crate::scheduler::{Inner, State};

/// Capacity of each worker's message channel.
pub(crate) const WORKER_CHANNEL_CAPACITY: usize = 16;

/// Error recorded when a worker exits without reporting an outcome.
pub(crate) const WORKER_CRASHED: &str = "Worker terminated unexpectedly";

/// Link between a running job and its supervision task.
pub(crate) struct WorkerHandle {
    /// Child of the scheduler's master token.
    pub(crate) cancel: CancellationToken,
    pub(crate) task: JoinHandle<()>,
    pub(crate) started_at: Timestamp,
}

impl Inner {
    /// Admit pending jobs of `service` up to its cap and spawn their
    /// supervision tasks.
    ///
    /// Runs under the registry write lock, so the handle is recorded before
    /// the supervision task can observe any outcome.
    pub(crate) fn admit_locked(self: &Arc<Self>, state: &mut State, service: &Service) {
        if !state.accepting {
            return;
        }

        for job in state
            .registry
            .admit(service.id(), service.config.max_concurrent)
        {
            let cancel = self.cancel.child_token();
            let task = tokio::spawn(Arc::clone(self).supervise(
                job.id,
                service.clone(),
                job.params,
                cancel.clone(),
            ));
            state.active.insert(
                job.id,
                WorkerHandle {
                    cancel,
                    task,
                    started_at: job.started_at.unwrap_or(job.updated_at),
                },
            );

            tracing::info!(
                job_id = %job.id,
                service_id = %job.service_id,
                running = state.registry.running_count(service.id()),
                "Job admitted",
            );
            self.emit(JobEvent::Started {
                job_id: job.id,
                service_id: job.service_id,
            });
        }
    }

    async fn supervise(
        self: Arc<Self>,
        job_id: JobId,
        service: Service,
        params: serde_json::Value,
        cancel: CancellationToken,
    ) {
        let (tx, mut rx) = mpsc::channel(WORKER_CHANNEL_CAPACITY);
        let outbox = WorkerOutbox::new(job_id, tx);
        let runner = Arc::clone(&service.runner);
        let mut worker = tokio::spawn(async move {
            runner.run(WorkerInput { job_id, params }, outbox).await;
        });

        let outcome = self
            .relay(job_id, service.config.job_timeout, &mut rx, &mut worker, &cancel)
            .await;
        worker.abort();

        match outcome {
            Some(outcome) => self.complete(job_id, &service, outcome).await,
            None => tracing::debug!(%job_id, "Supervision cancelled"),
        }
    }

    /// Forward worker messages until a terminal outcome is known.
    ///
    /// Returns `None` when cancelled.
    async fn relay(
        &self,
        job_id: JobId,
        job_timeout: Option<Duration>,
        rx: &mut mpsc::Receiver<WorkerMessage>,
        worker: &mut JoinHandle<()>,
        cancel: &CancellationToken,
    ) -> Option<JobOutcome> {
        let deadline = async {
            match job_timeout {
                Some(limit) => {
                    tokio::time::sleep(limit).await;
                    limit
                }
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return None,

                limit = &mut deadline => {
                    tracing::warn!(%job_id, timeout_secs = limit.as_secs(), "Job timed out");
                    return Some(JobOutcome::Failed(format!(
                        "Generation timed out after {}s",
                        limit.as_secs()
                    )));
                }

                msg = rx.recv() => match msg {
                    Some(msg) => {
                        if let Some(outcome) = self.accept(job_id, msg).await {
                            return Some(outcome);
                        }
                    }
                    None => {
                        // Every sender is gone: the worker returned or panicked.
                        let panicked = matches!((&mut *worker).await, Err(e) if e.is_panic());
                        return Some(Self::crashed(job_id, panicked));
                    }
                },

                res = &mut *worker => {
                    // Helpers may still hold outbox clones, so the channel can
                    // outlive the worker. Messages already queued still count.
                    while let Ok(msg) = rx.try_recv() {
                        if let Some(outcome) = self.accept(job_id, msg).await {
                            return Some(outcome);
                        }
                    }
                    let panicked = matches!(res, Err(e) if e.is_panic());
                    return Some(Self::crashed(job_id, panicked));
                }
            }
        }
    }

    /// Apply one worker message. Returns the outcome for a terminal message.
    async fn accept(&self, job_id: JobId, msg: WorkerMessage) -> Option<JobOutcome> {
        match msg {
            msg if msg.job_id() != job_id => {
                tracing::warn!(
                    %job_id,
                    message_job_id = %msg.job_id(),
                    kind = msg.kind(),
                    "Ignoring message for another job",
                );
                None
            }
            WorkerMessage::Status { data, .. } => {
                self.record_progress(job_id, data).await;
                None
            }
            terminal => terminal.into_outcome(),
        }
    }

    fn crashed(job_id: JobId, panicked: bool) -> JobOutcome {
        tracing::error!(%job_id, panicked, "Worker exited without reporting a result");
        JobOutcome::Failed(WORKER_CRASHED.to_string())
    }

    async fn record_progress(&self, job_id: JobId, data: serde_json::Value) {
        let recorded = self
            .state
            .write()
            .await
            .registry
            .record_progress(job_id, data.clone());
        if recorded {
            tracing::debug!(%job_id, progress = %data, "Job progress");
            self.emit(JobEvent::Progress { job_id, data });
        }
    }

    /// Apply a terminal outcome, release the worker slot and re-run
    /// admission for the service.
    async fn complete(self: &Arc<Self>, job_id: JobId, service: &Service, outcome: JobOutcome) {
        let mut state = self.state.write().await;
        let handle = state.active.remove(&job_id);

        match state.registry.finish(job_id, outcome) {
            Some(job) => {
                let elapsed_ms = handle
                    .map(|h| (chrono::Utc::now() - h.started_at).num_milliseconds())
                    .unwrap_or_default();
                match job.error {
                    Some(error) => {
                        tracing::warn!(%job_id, service_id = %job.service_id, elapsed_ms, error = %error, "Job failed");
                        self.emit(JobEvent::Failed {
                            job_id,
                            service_id: job.service_id,
                            error,
                        });
                    }
                    None => {
                        tracing::info!(%job_id, service_id = %job.service_id, elapsed_ms, "Job completed");
                        self.emit(JobEvent::Completed {
                            job_id,
                            service_id: job.service_id,
                        });
                    }
                }
            }
            None => tracing::debug!(%job_id, "Ignoring outcome for finished job"),
        }

        self.admit_locked(&mut state, service);
    }
}
