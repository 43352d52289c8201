use std::net::SocketAddr;
use std::sync::Arc;

use genflow_client::RetryingClient;
use genflow_scheduler::{Scheduler, Service};
use genflow_worker::GenerationWorker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genflow_api::config::{scheduler_config_from_env, service_config_from_env, ServerConfig};
use genflow_api::router::build_app_router;
use genflow_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "genflow_api=debug,genflow_scheduler=debug,genflow_worker=debug,genflow_client=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    let client_config =
        genflow_worker::config::client_config_from_env().expect("Invalid generation client configuration");
    let scheduler_config = scheduler_config_from_env().expect("Invalid scheduler configuration");
    let service_config = service_config_from_env().expect("Invalid service configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        model = %client_config.model,
        max_retries = client_config.max_retries,
        "Loaded configuration",
    );

    let retry_budget = client_config.retry_budget();
    if let Some(limit) = service_config.job_timeout.filter(|t| *t < retry_budget) {
        tracing::warn!(
            job_timeout_secs = limit.as_secs(),
            retry_budget_secs = retry_budget.as_secs(),
            "Job timeout is shorter than the client's retry budget; slow retries will time out",
        );
    }

    let request_timeout = std::time::Duration::from_secs(config.request_timeout_secs);
    if let Some(limit) = service_config.job_timeout.filter(|t| *t >= request_timeout) {
        tracing::warn!(
            job_timeout_secs = limit.as_secs(),
            request_timeout_secs = config.request_timeout_secs,
            "Request timeout does not exceed the job timeout; generate calls may end in 408",
        );
    }

    // --- Generation worker ---
    let client = RetryingClient::new(client_config).expect("Failed to build generation client");
    let worker = GenerationWorker::new(Arc::new(client));

    // --- Scheduler ---
    let scheduler = Scheduler::start(
        scheduler_config,
        vec![Service::new(service_config, Arc::new(worker))],
    )
    .expect("Invalid service definition");
    tracing::info!("Scheduler started");

    // --- App state ---
    let state = AppState {
        scheduler: scheduler.clone(),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    scheduler.shutdown().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
