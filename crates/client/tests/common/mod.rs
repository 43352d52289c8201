#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use genflow_client::{ClientConfig, RawResponse, Transport, TransportError};

pub const IMAGE_BODY: &str = r#"{"candidates":[{"content":{"parts":[{"text":"done"},{"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}]}}]}"#;

pub const SNAKE_IMAGE_BODY: &str = r#"{"candidates":[{"content":{"parts":[{"inline_data":{"mime_type":"image/jpeg","data":"/9j/4AAQ"}}]}}]}"#;

/// A transport that replays a fixed script of responses.
///
/// When the script runs out the last entry is repeated, so a single
/// `429` entry means "always rate limited".
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

#[derive(Clone)]
pub enum Scripted {
    Respond(u16, String),
    Refuse,
    TimeOut,
}

/// What a single call looked like.
#[derive(Clone, Debug)]
pub struct Call {
    pub at: tokio::time::Instant,
    pub url: String,
    pub body: serde_json::Value,
    pub credential: String,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(status: u16, body: &str) -> Self {
        Self::new(vec![Scripted::Respond(status, body.to_string())])
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        credential: &str,
    ) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(Call {
            at: tokio::time::Instant::now(),
            url: url.to_string(),
            body: body.clone(),
            credential: credential.to_string(),
        });

        let next = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match script.pop_front() {
                Some(entry) => {
                    *last = Some(entry.clone());
                    entry
                }
                None => last.clone().expect("script must not be empty"),
            }
        };

        match next {
            Scripted::Respond(status, body) => Ok(RawResponse::new(status, body)),
            Scripted::Refuse => Err(TransportError::Connect("connection refused".into())),
            Scripted::TimeOut => Err(TransportError::Timeout),
        }
    }
}

/// Client config pointing at a fake base URL with the default retry policy.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        base_url: "http://generation.test/v1beta".into(),
        model: "test-model".into(),
        ..Default::default()
    }
}

/// Config with negligible backoff, for tests that use real time.
pub fn fast_config(base_url: String) -> ClientConfig {
    ClientConfig {
        base_url,
        model: "test-model".into(),
        base_delay: Duration::from_millis(5),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}
