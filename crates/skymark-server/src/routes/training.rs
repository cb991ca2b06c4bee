//! Fine-tuning admin routes.

use super::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use skymark_types::{FineTuningJob, FineTuningJobList};
use std::sync::Arc;

#[derive(Deserialize, Default)]
pub struct CreateJobRequest {
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub success: bool,
    pub message: String,
    pub job_info: FineTuningJob,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseModelRequest {
    #[serde(default)]
    pub model_id: Option<String>,
}

#[derive(Serialize)]
pub struct UseModelResponse {
    pub success: bool,
    pub message: String,
}

/// GET /api/training/jobs - Jobs as listed by the provider.
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> ApiResult<FineTuningJobList> {
    state
        .fine_tune
        .list_jobs()
        .await
        .map(Json)
        .map_err(|e| ApiError::from_core("Failed to fetch fine-tuning jobs", e))
}

/// GET /api/training/jobs/{jobId} - Live status of one job.
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<FineTuningJob> {
    state
        .fine_tune
        .job_status(&job_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_core("Failed to fetch job status", e))
}

/// POST /api/training/create-job - Build a training file from chat history and submit it.
///
/// The body is optional; an empty body trains the configured default model.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<CreateJobResponse> {
    let req: CreateJobRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateJobRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?
    };
    let model = req
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.config.default_fine_tune_model.clone());

    let job = state
        .fine_tune
        .create_job(&model)
        .await
        .map_err(|e| ApiError::from_core("Failed to create fine-tuning job", e))?;

    Ok(Json(CreateJobResponse {
        success: true,
        message: "Fine-tuning job created successfully".to_string(),
        job_info: job,
    }))
}

/// POST /api/training/use-model - Route chat completions to a fine-tuned model.
pub async fn use_model(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UseModelRequest>, JsonRejection>,
) -> ApiResult<UseModelResponse> {
    let Json(req) = payload?;
    let model_id = req.model_id.unwrap_or_default();

    state
        .fine_tune
        .use_model(&model_id)
        .map_err(|e| ApiError::from_core("Failed to set fine-tuned model", e))?;

    Ok(Json(UseModelResponse {
        success: true,
        message: format!("Now using fine-tuned model: {model_id}"),
    }))
}
