//! Classification of a single HTTP attempt.
//!
//! Terminal classifications (invalid credential, safety block) are checked
//! before the retry path, so a 400 "API key not valid" is never retried even
//! when it arrives with a retryable HTTP status.

use crate::error::ClientError;
use crate::response::{ApiErrorBody, GenerateResponse};

/// Codes that are retried, at both the HTTP and the application level.
pub const RETRYABLE_CODES: &[u16] = &[429, 500];

/// Upstream `status` markers used for policy rejections.
const SAFETY_STATUS_MARKERS: &[&str] = &["INVALID_ARGUMENT", "FAILED_PRECONDITION"];

/// Message fragments that identify a policy rejection.
const SAFETY_MESSAGE_MARKERS: &[&str] = &["safety", "policy", "blocked"];

/// Longest upstream body excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 200;

/// Outcome of one attempt.
#[derive(Debug, PartialEq)]
pub enum AttemptOutcome {
    /// At least one image was extracted.
    Success(Vec<String>),
    /// 429 or 500; eligible for another attempt.
    Retryable { code: u16, message: String },
    /// Never retried.
    Fatal(ClientError),
}

impl AttemptOutcome {
    /// Final error for a retryable outcome once retries are exhausted.
    pub fn exhausted(code: u16, message: String) -> ClientError {
        if code == 429 {
            ClientError::RateLimited
        } else {
            ClientError::Upstream { code, message }
        }
    }
}

/// Classify one HTTP response.
pub fn classify_response(status: u16, body: &str) -> AttemptOutcome {
    let http_ok = (200..300).contains(&status);

    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return if http_ok {
                AttemptOutcome::Fatal(ClientError::MalformedResponse(e.to_string()))
            } else if RETRYABLE_CODES.contains(&status) {
                AttemptOutcome::Retryable {
                    code: status,
                    message: excerpt(body, status),
                }
            } else {
                AttemptOutcome::Fatal(ClientError::Upstream {
                    code: status,
                    message: excerpt(body, status),
                })
            };
        }
    };

    if let Some(err) = ApiErrorBody::extract(&value) {
        return classify_api_error(status, err);
    }

    if !http_ok {
        return if RETRYABLE_CODES.contains(&status) {
            AttemptOutcome::Retryable {
                code: status,
                message: excerpt(body, status),
            }
        } else {
            AttemptOutcome::Fatal(ClientError::Upstream {
                code: status,
                message: excerpt(body, status),
            })
        };
    }

    let response: GenerateResponse = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => return AttemptOutcome::Fatal(ClientError::MalformedResponse(e.to_string())),
    };

    let images = response.extract_images();
    if !images.is_empty() {
        return AttemptOutcome::Success(images);
    }
    match response.block_reason() {
        Some(reason) => AttemptOutcome::Fatal(ClientError::ContentFlagged { reason }),
        None => AttemptOutcome::Fatal(ClientError::NoImages),
    }
}

/// Classify a decoded application error object.
fn classify_api_error(http_status: u16, err: ApiErrorBody) -> AttemptOutcome {
    let code = err.code.unwrap_or(http_status);

    if is_invalid_credential(code, &err.message) {
        return AttemptOutcome::Fatal(ClientError::InvalidCredential);
    }
    if is_safety_block(&err) {
        return AttemptOutcome::Fatal(ClientError::ContentFlagged {
            reason: err.message,
        });
    }
    if RETRYABLE_CODES.contains(&code) {
        return AttemptOutcome::Retryable {
            code,
            message: err.message,
        };
    }
    if RETRYABLE_CODES.contains(&http_status) {
        return AttemptOutcome::Retryable {
            code: http_status,
            message: err.message,
        };
    }
    AttemptOutcome::Fatal(ClientError::Upstream {
        code,
        message: err.message,
    })
}

/// A 400 (or 401/403) whose message talks about the API key.
fn is_invalid_credential(code: u16, message: &str) -> bool {
    if !matches!(code, 400 | 401 | 403) {
        return false;
    }
    let lower = message.to_ascii_lowercase();
    lower.contains("api key") || lower.contains("api_key")
}

fn is_safety_block(err: &ApiErrorBody) -> bool {
    let Some(status) = err.status.as_deref() else {
        return false;
    };
    if !SAFETY_STATUS_MARKERS.contains(&status) {
        return false;
    }
    let lower = err.message.to_ascii_lowercase();
    SAFETY_MESSAGE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Trimmed body text for an error message, or the bare status if empty.
fn excerpt(body: &str, status: u16) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    trimmed.chars().take(MAX_BODY_EXCERPT).collect()
}
