//! [`RetryingClient`]: one logical generation request with bounded retry.
//!
//! The retry loop is explicit: an attempt counter starting at 0, retried
//! only while the attempt was classified retryable (429/500) and the
//! counter is below `max_retries`. Transport failures are never retried
//! here; the caller may resubmit a fresh job instead.

use std::sync::Arc;

use crate::backoff::{retry_delay, with_jitter};
use crate::classify::{classify_response, AttemptOutcome};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::request::GenerateRequest;
use crate::transport::{HttpTransport, Transport, TransportError};

/// Successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImages {
    /// `data:` URIs, at least one.
    pub images: Vec<String>,
    /// Model that served the request.
    pub model: String,
    /// Total HTTP attempts made (1 + retries).
    pub attempts: u32,
}

/// Client for the external generation endpoint.
pub struct RetryingClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl RetryingClient {
    /// Create a client with the default HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self { config, transport })
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute `request`, retrying transient failures with exponential
    /// backoff.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        credential: &str,
    ) -> Result<GeneratedImages, ClientError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let url = self.config.endpoint(&model);
        let body = request.to_body();

        let mut attempt: u32 = 0;
        loop {
            let outcome = match self.transport.post_json(&url, &body, credential).await {
                Ok(raw) => classify_response(raw.status, &raw.body),
                Err(e) => AttemptOutcome::Fatal(self.transport_failure(e)),
            };

            match outcome {
                AttemptOutcome::Success(images) => {
                    tracing::info!(
                        model = %model,
                        attempts = attempt + 1,
                        image_count = images.len(),
                        "Generation succeeded",
                    );
                    return Ok(GeneratedImages {
                        images,
                        model,
                        attempts: attempt + 1,
                    });
                }
                AttemptOutcome::Retryable { code, message } => {
                    if attempt >= self.config.max_retries {
                        tracing::error!(
                            model = %model,
                            code,
                            attempts = attempt + 1,
                            "Generation failed after all retries",
                        );
                        return Err(AttemptOutcome::exhausted(code, message));
                    }
                    attempt += 1;
                    let delay = with_jitter(
                        retry_delay(self.config.base_delay, attempt),
                        self.config.jitter_ratio,
                    );
                    tracing::warn!(
                        model = %model,
                        code,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %message,
                        "Transient generation failure, retrying",
                    );
                    tokio::time::sleep(delay).await;
                }
                AttemptOutcome::Fatal(err) => {
                    tracing::warn!(
                        model = %model,
                        attempts = attempt + 1,
                        kind = err.kind(),
                        error = %err,
                        "Generation failed",
                    );
                    return Err(err);
                }
            }
        }
    }

    fn transport_failure(&self, e: TransportError) -> ClientError {
        match e {
            TransportError::Timeout => ClientError::Timeout(self.config.request_timeout.as_secs()),
            TransportError::Connect(detail) | TransportError::Build(detail) => {
                ClientError::Network { detail }
            }
        }
    }
}
