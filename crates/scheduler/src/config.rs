use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use genflow_core::runner::JobRunner;

/// Default per-job wall-clock limit.
///
/// Sits above the generation client's default retry budget (four 120 s
/// attempts plus 7 s of backoff) and below the HTTP server's 600 s request
/// timeout, so a slow but retrying upstream is not reported as timed out
/// and a waiting `generate` call sees the job's own failure first.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(540);

/// How long terminal jobs stay queryable.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);

/// How often the retention sweep runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Scheduler-wide settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Terminal jobs older than this are dropped by the sweep.
    pub retention: Duration,
    /// Interval between retention sweeps.
    pub sweep_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Settings of one service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub id: String,
    /// Maximum number of simultaneously running jobs. Must be at least 1.
    pub max_concurrent: usize,
    /// Wall-clock limit per job; `None` disables it. Keep it above the
    /// runner's own worst case, otherwise its retries are cut short.
    pub job_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            id: "image-generation".to_string(),
            max_concurrent: 2,
            job_timeout: Some(DEFAULT_JOB_TIMEOUT),
        }
    }
}

impl ServiceConfig {
    pub fn new(id: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            id: id.into(),
            max_concurrent,
            ..Default::default()
        }
    }

    pub fn with_job_timeout(mut self, job_timeout: Option<Duration>) -> Self {
        self.job_timeout = job_timeout;
        self
    }
}

/// A service registration: its settings plus the runner that executes
/// its jobs.
#[derive(Clone)]
pub struct Service {
    pub config: ServiceConfig,
    pub runner: Arc<dyn JobRunner>,
}

impl Service {
    pub fn new(config: ServiceConfig, runner: Arc<dyn JobRunner>) -> Self {
        Self { config, runner }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
