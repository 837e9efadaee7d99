use std::sync::Arc;

use crate::application::services::{
    AudioWorker, CallbackReconciler, LyricsWorker, SongService, StatusService,
};

#[derive(Clone)]
pub struct AppState {
    pub songs: Arc<SongService>,
    pub status: Arc<StatusService>,
    pub lyrics_worker: Arc<LyricsWorker>,
    pub audio_worker: Arc<AudioWorker>,
    pub reconciler: Arc<CallbackReconciler>,
}
