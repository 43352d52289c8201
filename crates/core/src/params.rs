//! Generation job parameters and their validation.
//!
//! The scheduler treats `params` as opaque JSON; the generation worker
//! decodes it into [`GenerationParams`] and validates it before any
//! network call is made.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Parameters of one image-generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Ordered input image references (file paths).
    #[serde(alias = "input_paths", alias = "inputs")]
    pub images: Vec<PathBuf>,
    /// Free-text instruction.
    #[serde(alias = "instruction")]
    pub prompt: String,
    /// Caller-supplied credential for the generation API.
    #[serde(alias = "credential", alias = "apiKey")]
    pub api_key: String,
    /// Optional model override; the client's configured model is used otherwise.
    #[serde(default)]
    pub model: Option<String>,
}

impl GenerationParams {
    /// Decode the opaque job payload.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid job parameters: {e}")))
    }

    /// Validate required fields.
    ///
    /// Rules:
    /// - The prompt must not be empty or whitespace-only.
    /// - At least one input image must be given, none of them empty.
    /// - The API key must not be empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Validation("Prompt must not be empty".to_string()));
        }
        if self.images.is_empty() {
            return Err(CoreError::Validation(
                "At least one input image is required".to_string(),
            ));
        }
        if let Some(i) = self.images.iter().position(|p| p.as_os_str().is_empty()) {
            return Err(CoreError::Validation(format!(
                "Input image at index {i} has an empty path"
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(CoreError::Validation("API key is required".to_string()));
        }
        Ok(())
    }
}
