use std::time::Duration;

use crate::backoff::retry_delay;

/// Default base URL of the generation API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default image-capable model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Header carrying the caller's credential.
pub const DEFAULT_CREDENTIAL_HEADER: &str = "x-goog-api-key";

/// Retries after the initial attempt (4 attempts in total).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Tunable parameters for [`RetryingClient`](crate::RetryingClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://host/v1beta`. The model endpoint is appended.
    pub base_url: String,
    /// Model used when the request does not override it.
    pub model: String,
    /// Header name the credential is sent in.
    pub credential_header: String,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each further retry.
    pub base_delay: Duration,
    /// Fraction of each delay added as random jitter. `0.0` disables jitter.
    pub jitter_ratio: f64,
    /// Timeout for a single HTTP attempt.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            credential_header: DEFAULT_CREDENTIAL_HEADER.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(1000),
            jitter_ratio: 0.0,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl ClientConfig {
    /// Full `generateContent` URL for `model`.
    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Longest a single `generate` call can take: every attempt hitting the
    /// request timeout plus the largest possible backoff between them.
    ///
    /// A job timeout shorter than this can cut off a call that would still
    /// have succeeded on a later attempt.
    pub fn retry_budget(&self) -> Duration {
        let attempts = self.max_retries.saturating_add(1);
        let backoff: Duration = (1..=self.max_retries)
            .map(|retry| {
                let delay = retry_delay(self.base_delay, retry);
                delay + delay.mul_f64(self.jitter_ratio.clamp(0.0, 1.0))
            })
            .sum();
        self.request_timeout.saturating_mul(attempts) + backoff
    }
}
