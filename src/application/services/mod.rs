mod audio_worker;
mod lyrics_worker;
mod reconciler;
mod service_error;
mod song_service;
mod status_service;

pub use audio_worker::AudioWorker;
pub use lyrics_worker::LyricsWorker;
pub use reconciler::{CallbackPayload, CallbackReconciler, ReconcileOutcome};
pub use service_error::ServiceError;
pub use song_service::SongService;
pub use status_service::{AudioStatusView, JobKey, LyricsStatusView, StatusService};

/// Result of one dequeue invocation. At most one job is processed per
/// invocation per stage, bounding runtime for the periodic trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueOutcome {
    ProcessedOne,
    Idle,
}
