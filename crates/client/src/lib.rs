//! Retrying HTTP client for the external image-generation API.
//!
//! Provides the request payload builder, a tolerant response parser,
//! error classification, exponential backoff, and the [`RetryingClient`]
//! that ties them together over a pluggable [`Transport`].

pub mod backoff;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{GeneratedImages, RetryingClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use request::{GenerateRequest, InlineImage};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
