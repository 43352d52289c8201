use genflow_client::ClientError;
use genflow_core::error::CoreError;

use crate::image_source::ImageSourceError;

/// Reasons a generation worker reports `error` for its job.
///
/// `Display` is the message placed in the job's `error` field.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Image(#[from] ImageSourceError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Internal worker error: {0}")]
    Internal(String),
}

impl From<CoreError> for WorkerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => WorkerError::Validation(msg),
            other => WorkerError::Internal(other.to_string()),
        }
    }
}

impl WorkerError {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Validation(_) => "validation",
            WorkerError::Image(_) => "image",
            WorkerError::Client(e) => e.kind(),
            WorkerError::Internal(_) => "internal",
        }
    }
}
