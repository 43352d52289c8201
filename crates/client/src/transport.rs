//! HTTP transport for generation requests.
//!
//! [`Transport`] performs exactly one POST and reports the raw status and
//! body; it never interprets them. [`HttpTransport`] is the [`reqwest`]
//! implementation. Tests substitute scripted transports.

use std::time::Duration;

use crate::config::ClientConfig;

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failures below the HTTP status line.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, reset, unreadable body.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The attempt exceeded the request timeout.
    #[error("Request timed out")]
    Timeout,

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Connect(e.to_string())
        }
    }
}

/// One POST of a JSON body with a credential header.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        credential: &str,
    ) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a pooled [`reqwest::Client`].
pub struct HttpTransport {
    client: reqwest::Client,
    credential_header: String,
}

impl HttpTransport {
    /// Build a transport using the timeout and credential header from
    /// `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self::with_client(client, &config.credential_header))
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling across
    /// services).
    pub fn with_client(client: reqwest::Client, credential_header: &str) -> Self {
        Self {
            client,
            credential_header: credential_header.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        credential: &str,
    ) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(self.credential_header.as_str(), credential)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
