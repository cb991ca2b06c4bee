//! HTTP route handlers.

pub mod chat;
pub mod training;

use crate::state::AppState;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use skymark_core::SkymarkError;
use std::sync::Arc;
use tracing::{error, warn};

/// JSON error envelope returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: error.into(),
                message: None,
                details: None,
            },
        }
    }

    /// Map a core error; `context` heads the envelope of server-side failures.
    pub fn from_core(context: &str, err: SkymarkError) -> Self {
        let (status, body) = match &err {
            SkymarkError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg.clone(),
                    message: None,
                    details: None,
                },
            ),
            SkymarkError::InsufficientTrainingData { found, required } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Not enough training data".to_string(),
                    message: Some(format!(
                        "You need at least {required} messages for fine-tuning (found {found})"
                    )),
                    details: None,
                },
            ),
            SkymarkError::InvalidTrainingData => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid training data".to_string(),
                    message: Some(err.to_string()),
                    details: None,
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: context.to_string(),
                    message: None,
                    details: Some(err.to_string()),
                },
            ),
        };

        if err.is_client_error() {
            warn!(target: "skymark::api", "{}: {}", context, err);
        } else {
            error!(target: "skymark::api", "{}: {}", context, err);
        }
        Self { status, body }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(target: "skymark::api", "Rejected request body: {}", rejection.body_text());
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: "Invalid request body".to_string(),
                message: None,
                details: Some(rejection.body_text()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// All API routes, mounted under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    let chat_routes = Router::new()
        .route(
            "/history/{owner_id}",
            get(chat::history).delete(chat::clear_history),
        )
        .route("/messages/{owner_id}", get(chat::messages))
        .route("/message", post(chat::send_message));

    let training_routes = Router::new()
        .route("/jobs", get(training::list_jobs))
        .route("/jobs/{job_id}", get(training::job_status))
        .route("/create-job", post(training::create_job))
        .route("/use-model", post(training::use_model));

    Router::new()
        .nest("/chat", chat_routes)
        .nest("/training", training_routes)
        .route("/health", get(health))
}
