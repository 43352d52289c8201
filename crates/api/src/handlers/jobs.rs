//! Handlers for the `/jobs` resource.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use genflow_core::error::CoreError;
use genflow_core::job::{Job, JobStatus};
use genflow_core::outcome::GenerationResult;
use genflow_core::types::JobId;
use genflow_scheduler::JobHandle;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /jobs` and `POST /jobs/generate`.
#[derive(Debug, Deserialize)]
pub struct SubmitJob {
    pub service_id: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Query parameters of `GET /jobs`.
#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
}

async fn submit(state: &AppState, input: SubmitJob) -> AppResult<JobHandle> {
    let service_id = input.service_id.trim();
    if service_id.is_empty() {
        return Err(AppError::BadRequest("service_id must not be empty".into()));
    }
    Ok(state.scheduler.submit(service_id, input.params).await?)
}

/// POST /api/v1/jobs
///
/// Queue a job and return it immediately with 202. Poll `GET /jobs/{id}`
/// for progress.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(input): Json<SubmitJob>,
) -> AppResult<impl IntoResponse> {
    let handle = submit(&state, input).await?;
    let job = state
        .scheduler
        .get_job(handle.id())
        .await
        .ok_or_else(|| AppError::InternalError(format!("job {} vanished", handle.id())))?;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: job })))
}

/// POST /api/v1/jobs/generate
///
/// Queue a job and wait for its terminal state. Job failures are reported
/// in the body (`success: false`), not as HTTP errors.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<SubmitJob>,
) -> AppResult<Json<DataResponse<GenerationResult>>> {
    let handle = submit(&state, input).await?;
    let job_id = handle.id();
    let outcome = handle.wait().await;
    tracing::debug!(%job_id, success = outcome.is_success(), "Generation request finished");

    Ok(Json(DataResponse {
        data: GenerationResult::from_outcome(&outcome),
    }))
}

/// GET /api/v1/jobs?status=
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> AppResult<Json<DataResponse<Vec<Job>>>> {
    let jobs = match query.status.as_deref() {
        Some(status) => {
            let status = JobStatus::from_str(status)?;
            state.scheduler.list_by_status(status).await
        }
        None => state.scheduler.list_jobs().await,
    };
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Job>>> {
    let job_id = JobId::parse_str(&id)
        .map_err(|_| AppError::BadRequest(format!("Invalid job id: {id}")))?;

    let job = state
        .scheduler
        .get_job(job_id)
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    Ok(Json(DataResponse { data: job }))
}
