use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::application::ports::{
    AudioClient, AudioSubmission, GenerationError, LyricsClient, SubmitError,
};

/// Scriptable lyrics client. Scripted results are consumed in order;
/// once exhausted the fixed default (if any) answers every call.
#[derive(Default)]
pub struct MockLyricsClient {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    default_text: Option<String>,
    calls: AtomicUsize,
}

impl MockLyricsClient {
    pub fn returning(text: &str) -> Self {
        Self {
            default_text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn push(&self, result: Result<String, GenerationError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LyricsClient for MockLyricsClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
        {
            return result;
        }
        match &self.default_text {
            Some(text) => Ok(text.clone()),
            None => Err(GenerationError::RequestFailed(
                "no scripted response".to_string(),
            )),
        }
    }
}

/// Scriptable audio client recording the last submission it saw.
#[derive(Default)]
pub struct MockAudioClient {
    script: Mutex<VecDeque<Result<String, SubmitError>>>,
    default_task: Option<String>,
    calls: AtomicUsize,
    last_submission: Mutex<Option<AudioSubmission>>,
}

impl MockAudioClient {
    pub fn accepting(task_id: &str) -> Self {
        Self {
            default_task: Some(task_id.to_string()),
            ..Self::default()
        }
    }

    pub fn push(&self, result: Result<String, SubmitError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<AudioSubmission> {
        self.last_submission
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl AudioClient for MockAudioClient {
    async fn submit(&self, submission: AudioSubmission) -> Result<String, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_submission
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(submission);

        if let Some(result) = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
        {
            return result;
        }
        match &self.default_task {
            Some(task) => Ok(task.clone()),
            None => Err(SubmitError::Rejected("no scripted response".to_string())),
        }
    }
}
