use std::sync::Arc;

use genflow_scheduler::Scheduler;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the scheduler is an `Arc` wrapper.
#[derive(Clone)]
pub struct AppState {
    /// The job scheduler, constructed once in `main`.
    pub scheduler: Scheduler,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
