#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use genflow_core::runner::{JobRunner, WorkerInput, WorkerOutbox};
use genflow_scheduler::{Scheduler, SchedulerConfig, Service, ServiceConfig};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use genflow_api::config::ServerConfig;
use genflow_api::router::build_app_router;
use genflow_api::state::AppState;

pub const SERVICE: &str = "image-generation";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Runner standing in for the generation worker.
///
/// Params `{"fail": "<message>"}` produce an `error`; anything else a
/// one-image result echoing `params.prompt`.
pub struct FakeGenerator;

#[async_trait::async_trait]
impl JobRunner for FakeGenerator {
    async fn run(&self, input: WorkerInput, outbox: WorkerOutbox) {
        outbox.status(json!({ "stage": "generating" })).await;
        if let Some(message) = input.params["fail"].as_str() {
            outbox.error(message).await;
            return;
        }
        outbox
            .result(json!({
                "images": ["data:image/png;base64,AAAA"],
                "metadata": {
                    "model": "test-model",
                    "timestamp": "2026-01-01T00:00:00Z",
                    "prompt": input.params["prompt"],
                },
            }))
            .await;
    }
}

/// Runner that never finishes.
pub struct StuckGenerator;

#[async_trait::async_trait]
impl JobRunner for StuckGenerator {
    async fn run(&self, _input: WorkerInput, _outbox: WorkerOutbox) {
        std::future::pending::<()>().await;
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// over a scheduler with a single `image-generation` service.
pub fn build_test_app(runner: Arc<dyn JobRunner>) -> (Router, Scheduler) {
    let scheduler = Scheduler::start(
        SchedulerConfig::default(),
        vec![Service::new(ServiceConfig::new(SERVICE, 2), runner)],
    )
    .expect("valid service");

    let config = test_config();
    let state = AppState {
        scheduler: scheduler.clone(),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), scheduler)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
