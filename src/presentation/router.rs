use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    audio_callback_handler, audio_dequeue_handler, audio_status_handler, create_song_handler,
    delete_song_handler, health_handler, lyrics_dequeue_handler, lyrics_status_handler,
    request_audio_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/songs", post(create_song_handler))
        .route("/api/v1/songs/{job_id}", delete(delete_song_handler))
        .route("/api/v1/songs/{job_id}/lyrics", get(lyrics_status_handler))
        // GET accepts either a job id or an external task ref in the
        // same position.
        .route(
            "/api/v1/songs/{job_id}/audio",
            post(request_audio_handler).get(audio_status_handler),
        )
        .route(
            "/api/v1/callbacks/audio/{job_id}",
            post(audio_callback_handler),
        )
        .route("/internal/dequeue/lyrics", post(lyrics_dequeue_handler))
        .route("/internal/dequeue/audio", post(audio_dequeue_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
