use std::sync::Arc;

use tracing::Instrument;

use crate::application::ports::{AudioClaim, AudioClient, AudioSubmission, JobStore, StoreError};
use crate::domain::{Job, JobStatus};

use super::DequeueOutcome;

/// Audio-stage processor. The claim, the fresh balance check and the
/// debit are one store transaction; submission follows outside it.
/// Failure policy: transient submission failures refund and return
/// the job to `audio_pending` in one atomic unit, so the next claim
/// re-debits. A job is never left charged without a pending retry,
/// and never charged twice.
pub struct AudioWorker {
    store: Arc<dyn JobStore>,
    audio: Arc<dyn AudioClient>,
    price: i64,
    /// Public base URL of this deployment, used to build the callback
    /// address the audio service will call.
    callback_base_url: String,
}

impl AudioWorker {
    pub fn new(
        store: Arc<dyn JobStore>,
        audio: Arc<dyn AudioClient>,
        price: i64,
        callback_base_url: String,
    ) -> Self {
        Self {
            store,
            audio,
            price,
            callback_base_url: callback_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn callback_url(&self, job: &Job) -> String {
        format!(
            "{}/api/v1/callbacks/audio/{}",
            self.callback_base_url,
            job.id.as_uuid()
        )
    }

    pub async fn run_once(&self) -> Result<DequeueOutcome, StoreError> {
        let job = match self.store.claim_next_audio(self.price).await? {
            AudioClaim::Idle => return Ok(DequeueOutcome::Idle),
            AudioClaim::InsufficientCredits(job) => {
                tracing::warn!(
                    job_id = %job.id.as_uuid(),
                    "Balance below price at audio claim, job failed without charge"
                );
                return Ok(DequeueOutcome::ProcessedOne);
            }
            AudioClaim::Claimed {
                job,
                pre_debit_balance,
            } => {
                tracing::info!(
                    job_id = %job.id.as_uuid(),
                    pre_debit_balance,
                    "Audio claim debited"
                );
                job
            }
        };

        let span = tracing::info_span!("audio_job", job_id = %job.id.as_uuid());
        self.submit_claimed(&job).instrument(span).await?;

        Ok(DequeueOutcome::ProcessedOne)
    }

    async fn submit_claimed(&self, job: &Job) -> Result<(), StoreError> {
        let Some(lyrics) = job.lyrics.clone() else {
            // An audio_pending job without lyrics cannot be submitted.
            tracing::error!("Claimed audio job has no lyrics");
            self.store
                .settle_with_refund(
                    job.id,
                    &[JobStatus::AudioProcessing],
                    JobStatus::Error,
                    self.price,
                    Some("job reached audio stage without lyrics"),
                )
                .await?;
            return Ok(());
        };

        let submission = AudioSubmission {
            title: job.title.clone(),
            style: job.style().to_string(),
            prompt: lyrics,
            callback_url: self.callback_url(job),
        };

        match self.audio.submit(submission).await {
            Ok(task_ref) => {
                let stored = self.store.store_task_ref(job.id, &task_ref).await?;
                if stored {
                    tracing::info!(task_ref = %task_ref, "Audio request accepted");
                } else {
                    tracing::error!(
                        task_ref = %task_ref,
                        "Job left audio_processing before the task ref was stored"
                    );
                }
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "Transient submission failure, refunding for retry");
                self.store
                    .settle_with_refund(
                        job.id,
                        &[JobStatus::AudioProcessing],
                        JobStatus::AudioPending,
                        self.price,
                        None,
                    )
                    .await?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Permanent submission failure, refunding");
                self.store
                    .settle_with_refund(
                        job.id,
                        &[JobStatus::AudioProcessing],
                        JobStatus::Error,
                        self.price,
                        Some(&e.to_string()),
                    )
                    .await?;
            }
        }

        Ok(())
    }
}
