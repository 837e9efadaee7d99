use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{JobId, SongBrief};
use crate::presentation::auth::VerifiedAccount;
use crate::presentation::state::AppState;

use super::{ErrorResponse, service_error_response};

#[derive(Deserialize)]
pub struct CreateSongRequest {
    pub title: String,
    pub description: String,
    pub style_preset: Option<String>,
    pub style_custom: Option<String>,
    pub tone: Option<String>,
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct CreateSongResponse {
    pub job_id: String,
}

#[derive(Serialize)]
pub struct RequestAudioResponse {
    pub job_id: String,
    pub message: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn create_song_handler(
    State(state): State<AppState>,
    VerifiedAccount(account): VerifiedAccount,
    Json(request): Json<CreateSongRequest>,
) -> impl IntoResponse {
    let brief = SongBrief {
        title: request.title,
        description: request.description,
        style_preset: request.style_preset,
        style_custom: request.style_custom,
        tone: request.tone,
        language: request.language,
    };

    match state.songs.create_job(account, brief).await {
        Ok(job_id) => (
            StatusCode::CREATED,
            Json(CreateSongResponse {
                job_id: job_id.as_uuid().to_string(),
            }),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn request_audio_handler(
    State(state): State<AppState>,
    VerifiedAccount(account): VerifiedAccount,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let Some(job_id) = parse_job_id(&job_id) else {
        return invalid_job_id(&job_id);
    };

    match state.songs.request_audio_stage(account, job_id).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(RequestAudioResponse {
                job_id: job_id.as_uuid().to_string(),
                message: "Audio generation queued".to_string(),
            }),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_song_handler(
    State(state): State<AppState>,
    VerifiedAccount(account): VerifiedAccount,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let Some(job_id) = parse_job_id(&job_id) else {
        return invalid_job_id(&job_id);
    };

    match state.songs.delete_job(account, job_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => service_error_response(e),
    }
}

pub(super) fn parse_job_id(raw: &str) -> Option<JobId> {
    Uuid::parse_str(raw).ok().map(JobId::from_uuid)
}

fn invalid_job_id(raw: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: format!("Invalid job ID: {}", raw),
        }),
    )
        .into_response()
}
