use std::sync::Arc;

use tracing::instrument;

use crate::application::ports::JobStore;
use crate::domain::{AccountId, Job, JobId, JobStatus};

use super::ServiceError;

/// How a client identifies a job on the audio read path: by our job
/// id or by the task id the audio service assigned.
#[derive(Debug, Clone)]
pub enum JobKey {
    Job(JobId),
    TaskRef(String),
}

#[derive(Debug, Clone)]
pub struct LyricsStatusView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AudioStatusView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub task_ref: Option<String>,
    pub artifact_url: Option<String>,
}

/// Ownership-checked read path. Never mutates; a job's error detail
/// stays internal, clients only see the status.
pub struct StatusService {
    store: Arc<dyn JobStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), fields(account_id = %account.as_uuid(), job_id = %job_id.as_uuid()))]
    pub async fn lyrics_status(
        &self,
        account: AccountId,
        job_id: JobId,
    ) -> Result<LyricsStatusView, ServiceError> {
        let job = self.owned_job(account, JobKey::Job(job_id)).await?;
        Ok(LyricsStatusView {
            job_id: job.id,
            status: job.status,
            // Only ever populated once the lyrics stage committed a
            // full text; never a partial payload.
            text: job.lyrics,
        })
    }

    #[instrument(skip(self, key), fields(account_id = %account.as_uuid()))]
    pub async fn audio_status(
        &self,
        account: AccountId,
        key: JobKey,
    ) -> Result<AudioStatusView, ServiceError> {
        let job = self.owned_job(account, key).await?;
        let artifact_url = if job.status == JobStatus::Complete {
            job.artifact_url
        } else {
            None
        };
        Ok(AudioStatusView {
            job_id: job.id,
            status: job.status,
            task_ref: job.task_ref,
            artifact_url,
        })
    }

    async fn owned_job(&self, account: AccountId, key: JobKey) -> Result<Job, ServiceError> {
        let job = match key {
            JobKey::Job(id) => self.store.find(id).await?,
            JobKey::TaskRef(task_ref) => self.store.find_by_task_ref(&task_ref).await?,
        }
        .ok_or(ServiceError::NotFound)?;

        if job.account_id != account {
            return Err(ServiceError::Forbidden);
        }
        Ok(job)
    }
}
