//! Request payload for the `generateContent` endpoint.

use serde::{Deserialize, Serialize};

/// A base64-encoded image embedded in the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    /// Standard base64, no `data:` prefix.
    pub data: String,
}

/// One logical generation request: instruction text plus input images.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub images: Vec<InlineImage>,
    /// Overrides the configured model when set.
    pub model: Option<String>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, images: Vec<InlineImage>) -> Self {
        Self {
            prompt: prompt.into(),
            images,
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// JSON body: the text part first, then one inline part per image.
    pub fn to_body(&self) -> serde_json::Value {
        let mut parts = Vec::with_capacity(self.images.len() + 1);
        parts.push(serde_json::json!({ "text": self.prompt }));
        for image in &self.images {
            parts.push(serde_json::json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": image.data,
                }
            }));
        }

        serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        })
    }
}
