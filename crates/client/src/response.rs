//! Tolerant decoding of `generateContent` responses.
//!
//! The upstream has emitted image parts in two naming conventions:
//!
//! ```text
//! {"inlineData":  {"mimeType":  "image/png", "data": "..."}}   camelCase
//! {"inline_data": {"mime_type": "image/png", "data": "..."}}   snake_case
//! ```
//!
//! [`Part`] keeps both as optional fields and [`Part::inline_data`] picks the
//! first one present (camelCase first). Errors come either wrapped as
//! `{"error": {code, message, status}}` or as a bare top-level
//! `{code, message, status}` object.

use serde::Deserialize;

/// MIME type assumed when an image part omits it.
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Candidate finish reasons that mean the output was withheld by policy.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "IMAGE_SAFETY",
    "BLOCKLIST",
    "SPII",
];

/// Decoded success body.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback", alias = "prompt_feedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, rename = "finishReason", alias = "finish_reason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One output part. At most one of the two image fields is expected, but
/// both are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "inlineData")]
    pub inline_data_camel: Option<InlineData>,
    #[serde(default, rename = "inline_data")]
    pub inline_data_snake: Option<InlineData>,
}

impl Part {
    /// The image payload of this part, camelCase shape first.
    pub fn inline_data(&self) -> Option<&InlineData> {
        self.inline_data_camel
            .as_ref()
            .or(self.inline_data_snake.as_ref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct InlineData {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

impl InlineData {
    /// `data:<mime>;base64,<data>` URI.
    pub fn to_data_uri(&self) -> String {
        let mime = self
            .mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);
        format!("data:{mime};base64,{}", self.data)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptFeedback {
    #[serde(default, rename = "blockReason", alias = "block_reason")]
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// All image payloads, in candidate then part order, as data URIs.
    /// Parts with empty data are skipped.
    pub fn extract_images(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(Part::inline_data)
            .filter(|d| !d.data.is_empty())
            .map(InlineData::to_data_uri)
            .collect()
    }

    /// Why the upstream withheld output, if it says so.
    pub fn block_reason(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Some(reason);
        }
        self.candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .find(|r| BLOCKING_FINISH_REASONS.contains(r))
            .map(str::to_string)
    }
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

/// Application-level error object.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiErrorBody {
    /// Find an error object in a decoded body: `{"error": {...}}` first,
    /// then a bare top-level `{code, message}`.
    pub fn extract(value: &serde_json::Value) -> Option<Self> {
        if let Some(inner) = value.get("error").filter(|v| v.is_object()) {
            return serde_json::from_value(inner.clone()).ok();
        }
        let looks_like_error = value.get("code").is_some_and(|c| c.is_u64())
            && value.get("message").is_some_and(|m| m.is_string());
        if looks_like_error {
            return serde_json::from_value(value.clone()).ok();
        }
        None
    }
}
