mod callback;
mod dequeue;
mod health;
mod songs;
mod status;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::ServiceError;

pub use callback::audio_callback_handler;
pub use dequeue::{audio_dequeue_handler, lyrics_dequeue_handler};
pub use health::health_handler;
pub use songs::{create_song_handler, delete_song_handler, request_audio_handler};
pub use status::{audio_status_handler, lyrics_status_handler};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map client-facing service failures to HTTP. Store failures stay
/// internal: logged, surfaced as an opaque 500.
pub(crate) fn service_error_response(e: ServiceError) -> Response {
    let (status, message) = match &e {
        ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        ServiceError::InsufficientCredits => {
            (StatusCode::PAYMENT_REQUIRED, "insufficient credits".to_string())
        }
        ServiceError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
        ServiceError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
        ServiceError::WrongState { expected, actual } => (
            StatusCode::CONFLICT,
            format!("job is {}, expected {}", actual, expected),
        ),
        ServiceError::Store(err) => {
            tracing::error!(error = %err, "Store failure on client path");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
        }
    };

    (status, Json(ErrorResponse { error: message })).into_response()
}
