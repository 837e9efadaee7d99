use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::JobKey;
use crate::domain::JobId;
use crate::presentation::auth::VerifiedAccount;
use crate::presentation::state::AppState;

use super::{ErrorResponse, service_error_response};

#[derive(Serialize)]
pub struct LyricsStatusResponse {
    pub job_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct AudioStatusResponse {
    pub job_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn lyrics_status_handler(
    State(state): State<AppState>,
    VerifiedAccount(account): VerifiedAccount,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid job ID: {}", job_id),
                }),
            )
                .into_response();
        }
    };

    match state
        .status
        .lyrics_status(account, JobId::from_uuid(uuid))
        .await
    {
        Ok(view) => (
            StatusCode::OK,
            Json(LyricsStatusResponse {
                job_id: view.job_id.as_uuid().to_string(),
                status: view.status.as_str().to_string(),
                text: view.text,
            }),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

/// The audio read path accepts either our job id or the task id the
/// audio service assigned.
#[tracing::instrument(skip(state))]
pub async fn audio_status_handler(
    State(state): State<AppState>,
    VerifiedAccount(account): VerifiedAccount,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let key = match Uuid::parse_str(&key) {
        Ok(uuid) => JobKey::Job(JobId::from_uuid(uuid)),
        Err(_) => JobKey::TaskRef(key),
    };

    match state.status.audio_status(account, key).await {
        Ok(view) => (
            StatusCode::OK,
            Json(AudioStatusResponse {
                job_id: view.job_id.as_uuid().to_string(),
                status: view.status.as_str().to_string(),
                task_ref: view.task_ref,
                artifact_url: view.artifact_url,
            }),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}
