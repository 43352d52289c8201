//! Terminal job outcomes and the caller-facing generation result.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Terminal outcome of a job, delivered to whoever awaits its handle.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The worker reported a `result`; carries its `data` verbatim.
    Completed(serde_json::Value),
    /// The worker reported an `error`, or the supervisor synthesized one.
    Failed(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }
}

/// Descriptive metadata attached to a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub model: String,
    pub timestamp: Timestamp,
    pub prompt: String,
}

/// Payload of a generation worker's `result` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// `data:<mime>;base64,<payload>` URIs, at least one.
    pub images: Vec<String>,
    pub metadata: GenerationMetadata,
}

/// Result shape returned to the application layer.
///
/// ```json
/// { "success": true, "images": ["data:image/png;base64,..."], "metadata": {...} }
/// { "success": false, "error": "Invalid API key" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GenerationMetadata>,
}

impl GenerationResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            images: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Build the caller-facing result from a job outcome.
    ///
    /// A completed job whose data does not decode as [`GenerationOutput`] is
    /// reported as a failure rather than an empty success.
    pub fn from_outcome(outcome: &JobOutcome) -> Self {
        match outcome {
            JobOutcome::Completed(data) => {
                match serde_json::from_value::<GenerationOutput>(data.clone()) {
                    Ok(output) => Self {
                        success: true,
                        images: Some(output.images),
                        error: None,
                        metadata: Some(output.metadata),
                    },
                    Err(e) => Self::failure(format!("Malformed worker result: {e}")),
                }
            }
            JobOutcome::Failed(error) => Self::failure(error.clone()),
        }
    }
}
