use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use crate::application::ports::{JobStore, StoreError};
use crate::domain::{JobId, JobStatus, normalize_artifact_url};

/// Payload of the out-of-band completion notification. Parsed
/// leniently: anything that does not carry a recognized outcome is
/// treated as malformed rather than rejected at the HTTP layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallbackPayload {
    pub task_id: Option<String>,
    pub outcome: Option<String>,
    // The service has been seen sending both spellings.
    #[serde(alias = "artifact")]
    pub artifact_url: Option<String>,
    pub failure_message: Option<String>,
}

/// What applying a callback did. Every variant is acknowledged to the
/// delivering service; the distinction exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Artifact persisted, job completed.
    Completed,
    /// Failure applied, debit refunded.
    Failed,
    /// Job already terminal; duplicate or late callback ignored.
    AlreadyTerminal,
    /// No job with that id; acknowledged with no persisted effect.
    UnknownJob,
    /// Payload carried no usable outcome; job failed without ledger
    /// changes.
    Malformed,
    /// Job state did not admit the callback; nothing applied.
    Conflict,
}

/// Applies completion notifications to job state, keyed strictly by
/// the job id embedded in the callback address. Idempotent: the
/// status guards on every mutation make a second identical callback a
/// no-op, and the refund guard makes double refunds impossible.
pub struct CallbackReconciler {
    store: Arc<dyn JobStore>,
    price: i64,
}

impl CallbackReconciler {
    pub fn new(store: Arc<dyn JobStore>, price: i64) -> Self {
        Self { store, price }
    }

    #[instrument(skip(self, payload), fields(job_id = %job_id.as_uuid()))]
    pub async fn apply(
        &self,
        job_id: JobId,
        payload: CallbackPayload,
    ) -> Result<ReconcileOutcome, StoreError> {
        let Some(job) = self.store.find(job_id).await? else {
            tracing::warn!("Callback for unknown job acknowledged and dropped");
            return Ok(ReconcileOutcome::UnknownJob);
        };

        if job.status.is_terminal() {
            tracing::info!(status = %job.status, "Callback for terminal job ignored");
            return Ok(ReconcileOutcome::AlreadyTerminal);
        }

        // The stored task ref is a logged cross-check only; routing
        // trusts the job id from the callback address.
        if let (Some(stored), Some(reported)) = (&job.task_ref, &payload.task_id) {
            if stored != reported {
                tracing::warn!(
                    stored = %stored,
                    reported = %reported,
                    "Task ref mismatch in callback; proceeding by job id"
                );
            }
        }

        match payload.outcome.as_deref() {
            Some("complete") => match payload.artifact_url.as_deref() {
                Some(raw_url) if !raw_url.trim().is_empty() => {
                    let url = normalize_artifact_url(raw_url);
                    let applied = self.store.complete(job_id, &url).await?;
                    if applied {
                        tracing::info!(artifact_url = %url, "Job completed");
                        Ok(ReconcileOutcome::Completed)
                    } else {
                        tracing::warn!(
                            status = %job.status,
                            "Completion callback for job not in processing"
                        );
                        Ok(ReconcileOutcome::Conflict)
                    }
                }
                _ => self.fail_malformed(&job, "complete callback without artifact url").await,
            },
            Some("fail") => {
                let message = payload
                    .failure_message
                    .as_deref()
                    .unwrap_or("audio generation failed");
                let applied = self
                    .store
                    .settle_with_refund(
                        job_id,
                        &[JobStatus::Processing, JobStatus::AudioProcessing],
                        JobStatus::Error,
                        self.price,
                        Some(message),
                    )
                    .await?;
                if applied {
                    tracing::info!("Failure callback applied, debit refunded");
                    Ok(ReconcileOutcome::Failed)
                } else {
                    tracing::warn!(status = %job.status, "Failure callback not applicable");
                    Ok(ReconcileOutcome::Conflict)
                }
            }
            other => {
                tracing::warn!(outcome = ?other, "Unrecognized callback outcome");
                self.fail_malformed(&job, "unrecognized callback payload").await
            }
        }
    }

    /// Malformed payloads fail the job for operator inspection but
    /// leave the ledger untouched.
    async fn fail_malformed(
        &self,
        job: &crate::domain::Job,
        message: &str,
    ) -> Result<ReconcileOutcome, StoreError> {
        if !job.status.can_transition_to(JobStatus::Error) {
            tracing::warn!(status = %job.status, "Callback for job outside the audio stage ignored");
            return Ok(ReconcileOutcome::Conflict);
        }
        let applied = self
            .store
            .transition(job.id, job.status, JobStatus::Error, Some(message))
            .await?;
        if applied {
            Ok(ReconcileOutcome::Malformed)
        } else {
            Ok(ReconcileOutcome::Conflict)
        }
    }
}
