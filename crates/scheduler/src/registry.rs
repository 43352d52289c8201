//! In-memory job registry.
//!
//! [`JobRegistry`] holds every job, the per-service FIFO of pending jobs,
//! per-service running counts and the outcome waiters. It is plain data:
//! the scheduler owns it behind a single write lock, which makes every
//! mutation (including the admission cap check) atomic.

use std::collections::{HashMap, VecDeque};

use genflow_core::job::{Job, JobStatus};
use genflow_core::outcome::JobOutcome;
use genflow_core::types::{JobId, Timestamp};
use tokio::sync::oneshot;

struct Entry {
    /// Insertion order; breaks ties between equal `created_at` values.
    seq: u64,
    job: Job,
    waiter: Option<oneshot::Sender<JobOutcome>>,
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<JobId, Entry>,
    pending: HashMap<String, VecDeque<JobId>>,
    running: HashMap<String, usize>,
    next_seq: u64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new `pending` job to the back of its service's queue.
    pub fn insert(&mut self, job: Job, waiter: oneshot::Sender<JobOutcome>) {
        let id = job.id;
        self.pending
            .entry(job.service_id.clone())
            .or_default()
            .push_back(id);
        self.jobs.insert(
            id,
            Entry {
                seq: self.next_seq,
                job,
                waiter: Some(waiter),
            },
        );
        self.next_seq += 1;
    }

    /// Move pending jobs of `service_id` to `running`, oldest first, until
    /// the service has `cap` running jobs or its queue is empty.
    ///
    /// Returns snapshots of the admitted jobs in admission order.
    pub fn admit(&mut self, service_id: &str, cap: usize) -> Vec<Job> {
        let mut admitted = Vec::new();
        let Some(queue) = self.pending.get_mut(service_id) else {
            return admitted;
        };
        let running = self.running.entry(service_id.to_string()).or_insert(0);

        while *running < cap {
            let Some(id) = queue.pop_front() else { break };
            let Some(entry) = self.jobs.get_mut(&id) else {
                continue;
            };
            if entry.job.mark_running().is_err() {
                continue;
            }
            *running += 1;
            admitted.push(entry.job.clone());
        }
        admitted
    }

    /// Record a `status` message. Ignored unless the job is running.
    pub fn record_progress(&mut self, id: JobId, data: serde_json::Value) -> bool {
        match self.jobs.get_mut(&id) {
            Some(entry) if entry.job.status == JobStatus::Running => {
                entry.job.record_progress(data);
                true
            }
            _ => false,
        }
    }

    /// Apply a terminal outcome and notify the waiter.
    ///
    /// Returns the finished job, or `None` if the job is unknown or already
    /// terminal. A job is finished at most once.
    pub fn finish(&mut self, id: JobId, outcome: JobOutcome) -> Option<Job> {
        let entry = self.jobs.get_mut(&id)?;
        entry.job.finish(&outcome).ok()?;

        if let Some(count) = self.running.get_mut(&entry.job.service_id) {
            *count = count.saturating_sub(1);
        }

        if let Some(waiter) = entry.waiter.take() {
            let _ = waiter.send(outcome);
        }
        Some(entry.job.clone())
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.jobs.get(&id).map(|e| e.job.clone())
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> Vec<Job> {
        self.collect(|_| true)
    }

    /// Jobs in `status`, oldest first.
    pub fn list_by_status(&self, status: JobStatus) -> Vec<Job> {
        self.collect(|job| job.status == status)
    }

    pub fn running_count(&self, service_id: &str) -> usize {
        self.running.get(service_id).copied().unwrap_or(0)
    }

    pub fn pending_count(&self, service_id: &str) -> usize {
        self.pending.get(service_id).map_or(0, VecDeque::len)
    }

    /// Running jobs across all services.
    pub fn active_count(&self) -> usize {
        self.running.values().sum()
    }

    /// Drop terminal jobs that finished before `cutoff`. Returns how many
    /// were removed.
    pub fn sweep(&mut self, cutoff: Timestamp) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, entry| {
            !(entry.job.status.is_terminal()
                && entry.job.finished_at.is_some_and(|at| at < cutoff))
        });
        before - self.jobs.len()
    }

    /// Fail every waiter still outstanding with `message` and drop all jobs.
    pub fn clear(&mut self, message: &str) {
        for (_, mut entry) in self.jobs.drain() {
            if let Some(waiter) = entry.waiter.take() {
                let _ = waiter.send(JobOutcome::Failed(message.to_string()));
            }
        }
        self.pending.clear();
        self.running.clear();
    }

    fn collect(&self, keep: impl Fn(&Job) -> bool) -> Vec<Job> {
        let mut entries: Vec<&Entry> = self.jobs.values().filter(|e| keep(&e.job)).collect();
        entries.sort_by_key(|e| (e.job.created_at, e.seq));
        entries.into_iter().map(|e| e.job.clone()).collect()
    }
}
