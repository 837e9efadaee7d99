#![allow(dead_code)]

use std::sync::Arc;

use songsmith::application::ports::{JobStore, Ledger};
use songsmith::application::services::{
    AudioWorker, CallbackReconciler, LyricsWorker, SongService, StatusService,
};
use songsmith::domain::{AccountId, JobId, SongBrief};
use songsmith::infrastructure::generation::{MockAudioClient, MockLyricsClient};
use songsmith::infrastructure::persistence::InMemoryStore;

pub const PRICE: i64 = 1;
pub const DEFAULT_LYRICS: &str = "Run, run, run";
pub const DEFAULT_TASK_REF: &str = "T1";
pub const CALLBACK_BASE_URL: &str = "https://songs.example.com";

/// Full pipeline wired over the in-memory store and scriptable
/// clients; no external services involved.
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub lyrics_client: Arc<MockLyricsClient>,
    pub audio_client: Arc<MockAudioClient>,
    pub songs: SongService,
    pub status: StatusService,
    pub lyrics_worker: Arc<LyricsWorker>,
    pub audio_worker: Arc<AudioWorker>,
    pub reconciler: CallbackReconciler,
}

impl TestHarness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let lyrics_client = Arc::new(MockLyricsClient::returning(DEFAULT_LYRICS));
        let audio_client = Arc::new(MockAudioClient::accepting(DEFAULT_TASK_REF));

        let songs = SongService::new(store.clone(), store.clone(), PRICE);
        let status = StatusService::new(store.clone());
        let lyrics_worker = Arc::new(LyricsWorker::new(store.clone(), lyrics_client.clone()));
        let audio_worker = Arc::new(AudioWorker::new(
            store.clone(),
            audio_client.clone(),
            PRICE,
            CALLBACK_BASE_URL.to_string(),
        ));
        let reconciler = CallbackReconciler::new(store.clone(), PRICE);

        Self {
            store,
            lyrics_client,
            audio_client,
            songs,
            status,
            lyrics_worker,
            audio_worker,
            reconciler,
        }
    }

    pub fn account_with_balance(&self, balance: i64) -> AccountId {
        let account = AccountId::new();
        self.store.put_account(account, balance);
        account
    }

    pub async fn balance(&self, account: AccountId) -> i64 {
        self.store
            .balance(account)
            .await
            .expect("account should exist")
    }

    pub async fn job_status(&self, job_id: JobId) -> songsmith::domain::JobStatus {
        self.store
            .find(job_id)
            .await
            .expect("store lookup should succeed")
            .expect("job should exist")
            .status
    }

    pub async fn job(&self, job_id: JobId) -> songsmith::domain::Job {
        self.store
            .find(job_id)
            .await
            .expect("store lookup should succeed")
            .expect("job should exist")
    }
}

pub fn brief() -> SongBrief {
    SongBrief {
        title: "Night Drive".to_string(),
        description: "driving alone through a sleeping city".to_string(),
        style_preset: Some("synthwave".to_string()),
        style_custom: None,
        tone: None,
        language: None,
    }
}
