//! Environment configuration for the generation client.
//!
//! Shared by the `genflow-worker` binary and the API server so both build
//! the client from the same variables.

use std::time::Duration;

use genflow_client::config::{
    DEFAULT_BASE_URL, DEFAULT_CREDENTIAL_HEADER, DEFAULT_MAX_RETRIES, DEFAULT_MODEL,
};
use genflow_client::ClientConfig;

/// A variable was set to a value that does not parse.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Read `var`, falling back to `default` when unset.
pub fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Read and parse `var`, falling back to `default` when unset.
pub fn env_parse<T: std::str::FromStr>(
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError {
            var,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Load the client configuration.
///
/// | Env Var                           | Default                                             |
/// |-----------------------------------|-----------------------------------------------------|
/// | `GENERATION_API_URL`              | `https://generativelanguage.googleapis.com/v1beta`  |
/// | `GENERATION_MODEL`                | `gemini-2.5-flash-image`                            |
/// | `GENERATION_CREDENTIAL_HEADER`    | `x-goog-api-key`                                    |
/// | `GENERATION_MAX_RETRIES`          | `3`                                                 |
/// | `GENERATION_RETRY_BASE_MS`        | `1000`                                              |
/// | `GENERATION_RETRY_JITTER`         | `0.0`                                               |
/// | `GENERATION_REQUEST_TIMEOUT_SECS` | `120`                                               |
pub fn client_config_from_env() -> Result<ClientConfig, ConfigError> {
    let jitter_ratio: f64 = env_parse("GENERATION_RETRY_JITTER", 0.0, "a number")?;
    if !(0.0..=1.0).contains(&jitter_ratio) {
        return Err(ConfigError {
            var: "GENERATION_RETRY_JITTER",
            expected: "between 0.0 and 1.0",
            value: jitter_ratio.to_string(),
        });
    }

    Ok(ClientConfig {
        base_url: env_or("GENERATION_API_URL", DEFAULT_BASE_URL),
        model: env_or("GENERATION_MODEL", DEFAULT_MODEL),
        credential_header: env_or("GENERATION_CREDENTIAL_HEADER", DEFAULT_CREDENTIAL_HEADER),
        max_retries: env_parse(
            "GENERATION_MAX_RETRIES",
            DEFAULT_MAX_RETRIES,
            "a non-negative integer",
        )?,
        base_delay: Duration::from_millis(env_parse(
            "GENERATION_RETRY_BASE_MS",
            1000u64,
            "a number of milliseconds",
        )?),
        jitter_ratio,
        request_timeout: Duration::from_secs(env_parse(
            "GENERATION_REQUEST_TIMEOUT_SECS",
            120u64,
            "a number of seconds",
        )?),
    })
}
