#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use genflow_core::messages::WorkerMessage;
use genflow_core::runner::{JobRunner, WorkerInput, WorkerOutbox};
use genflow_core::types::{new_job_id, JobId};
use genflow_scheduler::{Scheduler, SchedulerConfig, Service, ServiceConfig};
use serde_json::json;
use tokio::sync::{oneshot, Notify};

pub const SERVICE: &str = "image-generation";

/// How a gated job ends once released.
#[derive(Debug, Clone)]
pub enum Release {
    Succeed(serde_json::Value),
    Fail(String),
    /// Send a result, then an error, then another result.
    Duplicate,
    Panic,
    /// Return without a terminal message.
    Silent,
}

/// Runner whose jobs block until the test releases them one by one.
///
/// Tracks how many jobs are inside `run` at once.
#[derive(Default)]
pub struct GatedRunner {
    gates: Mutex<HashMap<JobId, oneshot::Sender<Release>>>,
    started: Notify,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl GatedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_started(&self, id: JobId) -> bool {
        self.gates.lock().unwrap().contains_key(&id)
    }

    pub fn started_count(&self) -> usize {
        self.gates.lock().unwrap().len()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Wait until job `id` is running inside the runner.
    pub async fn wait_started(&self, id: JobId) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.started.notified();
                if self.is_started(id) {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("job never started");
    }

    /// Let job `id` finish the given way.
    pub async fn release(&self, id: JobId, how: Release) {
        self.wait_started(id).await;
        let gate = self.gates.lock().unwrap().remove(&id).expect("gate present");
        gate.send(how).expect("job still waiting");
    }
}

#[async_trait::async_trait]
impl JobRunner for GatedRunner {
    async fn run(&self, input: WorkerInput, outbox: WorkerOutbox) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(input.job_id, tx);
        self.started.notify_waiters();

        outbox.status(json!({ "stage": "waiting" })).await;
        let how = rx.await.unwrap_or(Release::Silent);
        self.current.fetch_sub(1, Ordering::SeqCst);

        match how {
            Release::Succeed(data) => {
                outbox.result(data).await;
            }
            Release::Fail(error) => {
                outbox.error(error).await;
            }
            Release::Duplicate => {
                outbox.result(json!({ "first": true })).await;
                outbox.error("second").await;
                outbox.result(json!({ "third": true })).await;
            }
            Release::Panic => panic!("worker blew up"),
            Release::Silent => {}
        }
    }
}

/// Runner that completes immediately, echoing its params.
pub struct EchoRunner;

#[async_trait::async_trait]
impl JobRunner for EchoRunner {
    async fn run(&self, input: WorkerInput, outbox: WorkerOutbox) {
        outbox.status(json!({ "stage": "echoing" })).await;
        outbox.result(json!({ "echo": input.params })).await;
    }
}

/// Runner that never finishes.
pub struct HangingRunner;

#[async_trait::async_trait]
impl JobRunner for HangingRunner {
    async fn run(&self, _input: WorkerInput, _outbox: WorkerOutbox) {
        std::future::pending::<()>().await;
    }
}

/// Runner that first reports on behalf of some other job id.
pub struct ImpostorRunner;

#[async_trait::async_trait]
impl JobRunner for ImpostorRunner {
    async fn run(&self, input: WorkerInput, outbox: WorkerOutbox) {
        let other = new_job_id();
        outbox
            .send(WorkerMessage::Error {
                job_id: other,
                error: "not mine".into(),
            })
            .await;
        outbox.result(json!({ "job": input.job_id })).await;
    }
}

/// How a [`StrayOutboxRunner`] leaves `run`.
#[derive(Debug, Clone, Copy)]
pub enum StrayExit {
    Panic,
    Return,
    /// Report a result, then return.
    Report,
}

/// Runner that hands an outbox clone to a long-lived helper task before
/// leaving, so the message channel stays open after the worker is gone.
pub struct StrayOutboxRunner(pub StrayExit);

#[async_trait::async_trait]
impl JobRunner for StrayOutboxRunner {
    async fn run(&self, input: WorkerInput, outbox: WorkerOutbox) {
        let held = outbox.clone();
        tokio::spawn(async move {
            let _held = held;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        match self.0 {
            StrayExit::Panic => panic!("worker blew up"),
            StrayExit::Return => {}
            StrayExit::Report => {
                outbox.result(json!({ "job": input.job_id })).await;
            }
        }
    }
}

pub fn start_with(runner: Arc<dyn JobRunner>, config: ServiceConfig) -> Scheduler {
    Scheduler::start(SchedulerConfig::default(), vec![Service::new(config, runner)])
        .expect("valid services")
}

pub fn service(cap: usize) -> ServiceConfig {
    ServiceConfig::new(SERVICE, cap)
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
