use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::services::DequeueOutcome;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct DequeueResponse {
    pub result: String,
}

/// Trigger endpoints for the periodic invoker. Stage outcomes never
/// surface here; a failed generation still counts as processed and
/// becomes visible only through the status queries.
#[tracing::instrument(skip(state))]
pub async fn lyrics_dequeue_handler(State(state): State<AppState>) -> impl IntoResponse {
    dequeue_response("lyrics", state.lyrics_worker.run_once().await)
}

#[tracing::instrument(skip(state))]
pub async fn audio_dequeue_handler(State(state): State<AppState>) -> impl IntoResponse {
    dequeue_response("audio", state.audio_worker.run_once().await)
}

fn dequeue_response(
    stage: &str,
    outcome: Result<DequeueOutcome, crate::application::ports::StoreError>,
) -> axum::response::Response {
    match outcome {
        Ok(DequeueOutcome::ProcessedOne) => (
            StatusCode::OK,
            Json(DequeueResponse {
                result: "processed_one".to_string(),
            }),
        )
            .into_response(),
        Ok(DequeueOutcome::Idle) => (
            StatusCode::OK,
            Json(DequeueResponse {
                result: "idle".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(stage = stage, error = %e, "Dequeue failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DequeueResponse {
                    result: "internal_error".to_string(),
                }),
            )
                .into_response()
        }
    }
}
