use std::time::Duration;

use genflow_scheduler::{SchedulerConfig, ServiceConfig};
use genflow_worker::config::{env_or, env_parse, ConfigError};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`). Generous because
    /// `POST /api/v1/jobs/generate` waits for the job to finish.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 600,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `600`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: env_or("HOST", &defaults.host),
            port: env_parse("PORT", defaults.port, "a valid port number")?,
            cors_origins,
            request_timeout_secs: env_parse(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
                "a number of seconds",
            )?,
        })
    }
}

/// Load the scheduler settings.
///
/// | Env Var                   | Default |
/// |---------------------------|---------|
/// | `JOB_RETENTION_SECS`      | `300`   |
/// | `JOB_SWEEP_INTERVAL_SECS` | `60`    |
pub fn scheduler_config_from_env() -> Result<SchedulerConfig, ConfigError> {
    let defaults = SchedulerConfig::default();
    let sweep_interval_secs = env_parse(
        "JOB_SWEEP_INTERVAL_SECS",
        defaults.sweep_interval.as_secs(),
        "a number of seconds",
    )?;
    if sweep_interval_secs == 0 {
        return Err(ConfigError {
            var: "JOB_SWEEP_INTERVAL_SECS",
            expected: "at least 1",
            value: "0".to_string(),
        });
    }

    Ok(SchedulerConfig {
        retention: Duration::from_secs(env_parse(
            "JOB_RETENTION_SECS",
            defaults.retention.as_secs(),
            "a number of seconds",
        )?),
        sweep_interval: Duration::from_secs(sweep_interval_secs),
    })
}

/// Load the image-generation service settings.
///
/// | Env Var                  | Default            |
/// |--------------------------|--------------------|
/// | `SERVICE_ID`             | `image-generation` |
/// | `SERVICE_MAX_CONCURRENT` | `2`                |
/// | `JOB_TIMEOUT_SECS`       | `540` (`0` = none) |
pub fn service_config_from_env() -> Result<ServiceConfig, ConfigError> {
    let defaults = ServiceConfig::default();

    let max_concurrent = env_parse(
        "SERVICE_MAX_CONCURRENT",
        defaults.max_concurrent,
        "a positive integer",
    )?;
    if max_concurrent == 0 {
        return Err(ConfigError {
            var: "SERVICE_MAX_CONCURRENT",
            expected: "a positive integer",
            value: "0".to_string(),
        });
    }

    let timeout_secs: u64 = env_parse(
        "JOB_TIMEOUT_SECS",
        defaults.job_timeout.map_or(0, |t| t.as_secs()),
        "a number of seconds",
    )?;

    Ok(ServiceConfig::new(env_or("SERVICE_ID", &defaults.id), max_concurrent)
        .with_job_timeout((timeout_secs > 0).then(|| Duration::from_secs(timeout_secs))))
}
