//! Classified failures of a logical generation request.
//!
//! The `Display` text of each variant is the short, user-facing message
//! that ends up in a failed job's `error` field.

/// Final error returned by [`RetryingClient::generate`](crate::RetryingClient::generate).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The upstream rejected the credential.
    #[error("Invalid API key")]
    InvalidCredential,

    /// HTTP or application 429 persisted through every retry.
    #[error("Rate limit reached, try again shortly")]
    RateLimited,

    /// The request or its output was blocked by the upstream safety filter.
    #[error("Content flagged by the safety filter: {reason}")]
    ContentFlagged {
        /// Upstream block reason or message.
        reason: String,
    },

    /// Any other application-level error reported by the upstream,
    /// including a 500 that persisted through every retry.
    #[error("Generation API error ({code}): {message}")]
    Upstream {
        /// Application error code (or HTTP status when the body had none).
        code: u16,
        /// Upstream message.
        message: String,
    },

    /// Connectivity failure below HTTP (refused, DNS, reset).
    #[error("Network unreachable, check your connection")]
    Network {
        /// Transport detail, for logs only.
        detail: String,
    },

    /// A single attempt exceeded the configured request timeout.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// HTTP success, but no image payload in any candidate.
    #[error("No images produced")]
    NoImages,

    /// HTTP success with a body that is not valid JSON.
    #[error("Unexpected response from the generation API: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::InvalidCredential => "invalid_credential",
            ClientError::RateLimited => "rate_limited",
            ClientError::ContentFlagged { .. } => "content_flagged",
            ClientError::Upstream { .. } => "upstream",
            ClientError::Network { .. } => "network",
            ClientError::Timeout(_) => "timeout",
            ClientError::NoImages => "no_images",
            ClientError::MalformedResponse(_) => "malformed_response",
        }
    }
}
