use std::sync::Arc;

use tracing::Instrument;

use crate::application::ports::{JobStore, LyricsClient, StoreError};
use crate::domain::{Job, JobStatus};

use super::DequeueOutcome;

/// Lyrics-stage processor. Each invocation claims at most one
/// `lyrics_pending` job, runs one bounded-timeout text generation and
/// commits either the full text or `lyrics_error`, never partial
/// output. Safe to invoke on a fixed schedule even when invocations
/// overlap: coordination happens in the store's atomic claim.
pub struct LyricsWorker {
    store: Arc<dyn JobStore>,
    lyrics: Arc<dyn LyricsClient>,
}

impl LyricsWorker {
    pub fn new(store: Arc<dyn JobStore>, lyrics: Arc<dyn LyricsClient>) -> Self {
        Self { store, lyrics }
    }

    pub async fn run_once(&self) -> Result<DequeueOutcome, StoreError> {
        let Some(job) = self
            .store
            .claim_next(JobStatus::LyricsPending, JobStatus::LyricsProcessing)
            .await?
        else {
            return Ok(DequeueOutcome::Idle);
        };

        let span = tracing::info_span!("lyrics_job", job_id = %job.id.as_uuid());
        self.process(&job).instrument(span).await?;

        Ok(DequeueOutcome::ProcessedOne)
    }

    async fn process(&self, job: &Job) -> Result<(), StoreError> {
        match self.lyrics.generate(&job.lyrics_prompt()).await {
            Ok(text) if !text.trim().is_empty() => {
                let stored = self.store.store_lyrics(job.id, text.trim()).await?;
                if stored {
                    tracing::info!(chars = text.trim().len(), "Lyrics generated");
                } else {
                    tracing::warn!("Job left lyrics_processing before lyrics were stored");
                }
            }
            Ok(_) => {
                tracing::warn!("Lyrics service returned empty text");
                self.fail(job, "empty response from lyrics service").await?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Lyrics generation failed");
                self.fail(job, &e.to_string()).await?;
            }
        }
        Ok(())
    }

    async fn fail(&self, job: &Job, message: &str) -> Result<(), StoreError> {
        self.store
            .transition(
                job.id,
                JobStatus::LyricsProcessing,
                JobStatus::LyricsError,
                Some(message),
            )
            .await?;
        Ok(())
    }
}
