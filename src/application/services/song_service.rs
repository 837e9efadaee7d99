use std::sync::Arc;

use tracing::instrument;

use crate::application::ports::{JobStore, Ledger};
use crate::domain::{AccountId, Job, JobId, JobStatus, SongBrief};

use super::ServiceError;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_STYLE_LEN: usize = 500;

/// Client-facing command path: admission, explicit advance to the
/// audio stage, and deletion of terminal jobs. Every operation checks
/// ownership; only admission and the audio advance touch the balance
/// gate, and neither charges.
pub struct SongService {
    store: Arc<dyn JobStore>,
    ledger: Arc<dyn Ledger>,
    price: i64,
}

impl SongService {
    pub fn new(store: Arc<dyn JobStore>, ledger: Arc<dyn Ledger>, price: i64) -> Self {
        Self {
            store,
            ledger,
            price,
        }
    }

    /// Admit a new job in `lyrics_pending`, gated on balance ≥ price.
    /// No charge happens here; the only charge point is the
    /// audio-stage claim.
    #[instrument(skip(self, brief), fields(account_id = %account.as_uuid()))]
    pub async fn create_job(
        &self,
        account: AccountId,
        brief: SongBrief,
    ) -> Result<JobId, ServiceError> {
        validate_brief(&brief)?;

        let balance = self.ledger.balance(account).await?;
        if balance < self.price {
            return Err(ServiceError::InsufficientCredits);
        }

        let job = Job::new(account, brief);
        let job_id = job.id;
        self.store.insert(&job).await?;

        tracing::info!(job_id = %job_id.as_uuid(), "Song job admitted");
        Ok(job_id)
    }

    /// Advance a `lyrics_complete` job into the audio queue. Re-checks
    /// the balance (it may have changed since admission) but does not
    /// charge; the debit happens at the audio-stage claim.
    #[instrument(skip(self), fields(account_id = %account.as_uuid(), job_id = %job_id.as_uuid()))]
    pub async fn request_audio_stage(
        &self,
        account: AccountId,
        job_id: JobId,
    ) -> Result<(), ServiceError> {
        let job = self.owned_job(account, job_id).await?;

        if job.status != JobStatus::LyricsComplete {
            return Err(ServiceError::WrongState {
                expected: "lyrics_complete",
                actual: job.status,
            });
        }

        let balance = self.ledger.balance(account).await?;
        if balance < self.price {
            return Err(ServiceError::InsufficientCredits);
        }

        let advanced = self
            .store
            .transition(
                job_id,
                JobStatus::LyricsComplete,
                JobStatus::AudioPending,
                None,
            )
            .await?;
        if !advanced {
            // Lost a race with another call for the same job.
            let actual = self
                .store
                .find(job_id)
                .await?
                .map(|j| j.status)
                .unwrap_or(JobStatus::Error);
            return Err(ServiceError::WrongState {
                expected: "lyrics_complete",
                actual,
            });
        }

        tracing::info!("Audio stage requested");
        Ok(())
    }

    /// Delete a job. Permitted only to the owner and only once the
    /// job is terminal; in-flight jobs cannot be cancelled.
    #[instrument(skip(self), fields(account_id = %account.as_uuid(), job_id = %job_id.as_uuid()))]
    pub async fn delete_job(
        &self,
        account: AccountId,
        job_id: JobId,
    ) -> Result<(), ServiceError> {
        let job = self.owned_job(account, job_id).await?;

        if !job.status.is_terminal() {
            return Err(ServiceError::WrongState {
                expected: "a terminal status",
                actual: job.status,
            });
        }

        self.store.delete(job_id).await?;
        tracing::info!("Job deleted");
        Ok(())
    }

    async fn owned_job(&self, account: AccountId, job_id: JobId) -> Result<Job, ServiceError> {
        let job = self
            .store
            .find(job_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if job.account_id != account {
            return Err(ServiceError::Forbidden);
        }
        Ok(job)
    }
}

fn validate_brief(brief: &SongBrief) -> Result<(), ServiceError> {
    if brief.title.trim().is_empty() {
        return Err(ServiceError::Validation("title must not be empty".into()));
    }
    if brief.title.len() > MAX_TITLE_LEN {
        return Err(ServiceError::Validation(format!(
            "title exceeds {} characters",
            MAX_TITLE_LEN
        )));
    }
    if brief.description.trim().is_empty() {
        return Err(ServiceError::Validation(
            "description must not be empty".into(),
        ));
    }
    if brief.description.len() > MAX_DESCRIPTION_LEN {
        return Err(ServiceError::Validation(format!(
            "description exceeds {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    if let Some(style) = &brief.style_custom {
        if style.len() > MAX_STYLE_LEN {
            return Err(ServiceError::Validation(format!(
                "custom style exceeds {} characters",
                MAX_STYLE_LEN
            )));
        }
    }
    Ok(())
}
