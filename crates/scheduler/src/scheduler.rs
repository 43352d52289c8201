//! The [`Scheduler`]: job submission, admission and status queries.
//!
//! Created once at application startup via [`Scheduler::start`]. The
//! returned value is a cheap `Arc` wrapper that can be cloned into Axum
//! state and background tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use genflow_core::job::{Job, JobStatus};
use genflow_core::types::{new_job_id, JobId};
use tokio::sync::{broadcast, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{SchedulerConfig, Service};
use crate::error::SchedulerError;
use crate::events::JobEvent;
use crate::handle::{JobHandle, SHUTDOWN_MESSAGE};
use crate::registry::JobRegistry;
use crate::supervisor::WorkerHandle;

/// Broadcast channel capacity for job events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long shutdown waits for each supervision task to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Everything guarded by the single registry lock.
pub(crate) struct State {
    pub(crate) registry: JobRegistry,
    /// Handles of running jobs, keyed by job id.
    pub(crate) active: HashMap<JobId, WorkerHandle>,
    pub(crate) accepting: bool,
}

pub(crate) struct Inner {
    pub(crate) state: RwLock<State>,
    pub(crate) services: HashMap<String, Service>,
    pub(crate) events: broadcast::Sender<JobEvent>,
    /// Master cancellation token, cancelled during shutdown.
    pub(crate) cancel: CancellationToken,
    pub(crate) config: SchedulerConfig,
}

impl Inner {
    pub(crate) fn emit(&self, event: JobEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Per-service FIFO job scheduler.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
    sweeper: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Register `services` and start the retention sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: SchedulerConfig, services: Vec<Service>) -> Result<Self, SchedulerError> {
        let mut by_id = HashMap::new();
        for service in services {
            let id = service.id().to_string();
            let invalid = |reason: &str| SchedulerError::InvalidService {
                id: id.clone(),
                reason: reason.to_string(),
            };
            if id.trim().is_empty() {
                return Err(invalid("service id must not be empty"));
            }
            if service.config.max_concurrent == 0 {
                return Err(invalid("max_concurrent must be at least 1"));
            }
            if by_id.contains_key(&id) {
                return Err(invalid("registered twice"));
            }
            by_id.insert(id, service);
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let inner = Arc::new(Inner {
            state: RwLock::new(State {
                registry: JobRegistry::new(),
                active: HashMap::new(),
                accepting: true,
            }),
            services: by_id,
            events,
            cancel: CancellationToken::new(),
            config,
        });

        let sweeper = tokio::spawn(crate::sweep::run(Arc::clone(&inner)));

        for service in inner.services.values() {
            tracing::info!(
                service_id = %service.id(),
                max_concurrent = service.config.max_concurrent,
                job_timeout_secs = service.config.job_timeout.map(|t| t.as_secs()),
                "Service registered",
            );
        }

        Ok(Self {
            inner,
            sweeper: Arc::new(Mutex::new(Some(sweeper))),
        })
    }

    /// Queue a job for `service_id` and admit it if the service has
    /// capacity.
    pub async fn submit(
        &self,
        service_id: &str,
        params: serde_json::Value,
    ) -> Result<JobHandle, SchedulerError> {
        let service = self
            .inner
            .services
            .get(service_id)
            .ok_or_else(|| SchedulerError::UnknownService(service_id.to_string()))?;

        let mut state = self.inner.state.write().await;
        if !state.accepting {
            return Err(SchedulerError::ShutDown);
        }

        let job = Job::new(new_job_id(), service_id, params);
        let job_id = job.id;
        let (tx, rx) = oneshot::channel();
        state.registry.insert(job, tx);

        tracing::info!(%job_id, service_id, "Job submitted");
        self.inner.emit(JobEvent::Submitted {
            job_id,
            service_id: service_id.to_string(),
        });

        self.inner.admit_locked(&mut state, service);
        Ok(JobHandle::new(job_id, rx))
    }

    pub async fn get_job(&self, id: JobId) -> Option<Job> {
        self.inner.state.read().await.registry.get(id)
    }

    /// All retained jobs, oldest first.
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.inner.state.read().await.registry.list()
    }

    /// Retained jobs in `status`, oldest first.
    pub async fn list_by_status(&self, status: JobStatus) -> Vec<Job> {
        self.inner.state.read().await.registry.list_by_status(status)
    }

    pub async fn running_count(&self, service_id: &str) -> usize {
        self.inner.state.read().await.registry.running_count(service_id)
    }

    pub async fn pending_count(&self, service_id: &str) -> usize {
        self.inner.state.read().await.registry.pending_count(service_id)
    }

    /// Jobs with a live worker across all services.
    pub async fn active_count(&self) -> usize {
        self.inner.state.read().await.active.len()
    }

    /// Subscribe to job lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.events.subscribe()
    }

    /// Stop accepting jobs, cancel every worker and clear the registry.
    ///
    /// Waits up to 5 seconds per supervision task. Callers still waiting
    /// on a [`JobHandle`] receive `Failed("Scheduler shut down")`.
    pub async fn shutdown(&self) {
        let handles: Vec<(JobId, WorkerHandle)> = {
            let mut state = self.inner.state.write().await;
            if !state.accepting {
                return;
            }
            state.accepting = false;
            state.active.drain().collect()
        };

        tracing::info!(active = handles.len(), "Shutting down scheduler");
        self.inner.cancel.cancel();

        for (job_id, handle) in handles {
            handle.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_GRACE, handle.task).await.is_err() {
                tracing::warn!(%job_id, "Supervision task did not stop in time");
            }
        }

        if let Some(sweeper) = self.sweeper.lock().await.take() {
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, sweeper).await;
        }

        self.inner.state.write().await.registry.clear(SHUTDOWN_MESSAGE);
        tracing::info!("Scheduler shut down complete");
    }
}
