use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::CallbackPayload;
use crate::domain::JobId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct CallbackAck {
    pub status: String,
}

/// Completion callback from the audio service. Always acknowledged:
/// nothing this core cannot fix should make the delivering service
/// retry indefinitely. The body is parsed leniently so an unparseable
/// payload still reaches the reconciler as malformed instead of
/// bouncing at the HTTP layer.
#[tracing::instrument(skip(state, body))]
pub async fn audio_callback_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    let ack = (
        StatusCode::OK,
        Json(CallbackAck {
            status: "acknowledged".to_string(),
        }),
    );

    let Ok(uuid) = Uuid::parse_str(&job_id) else {
        tracing::warn!(raw_job_id = %job_id, "Callback with unparseable job id acknowledged");
        return ack;
    };

    let payload: CallbackPayload = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unparseable callback body treated as malformed");
        CallbackPayload::default()
    });

    if let Err(e) = state.reconciler.apply(JobId::from_uuid(uuid), payload).await {
        tracing::error!(error = %e, "Callback reconciliation hit a store failure");
    }

    ack
}
