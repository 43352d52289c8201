pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /jobs                 list (GET), submit (POST)
/// /jobs/generate        submit and wait for the result (POST)
/// /jobs/{id}            get (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/jobs", jobs::router())
}
