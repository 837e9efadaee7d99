use async_trait::async_trait;

use crate::domain::{Job, JobId, JobStatus};

use super::StoreError;

/// Result of an audio-stage claim attempt. The claim, the balance
/// check, and the debit are one atomic store operation.
#[derive(Debug)]
pub enum AudioClaim {
    /// Job moved to `audio_processing`; owner debited by the price.
    /// Carries the balance as it stood before the debit, for the
    /// charge audit trail.
    Claimed {
        job: Job,
        pre_debit_balance: i64,
    },
    /// Balance was below the price at claim time. The job has already
    /// been moved to `error` by the store; nothing was charged.
    InsufficientCredits(Job),
    /// No eligible job.
    Idle,
}

/// Durable job table with row-level, non-blocking claim support.
///
/// Implementations must make each method a single atomic unit: two
/// concurrent `claim_next` calls over one eligible row must yield
/// exactly one claim, and ledger mutations bundled into a method
/// (`claim_next_audio`, `settle_with_refund`) must commit together
/// with their status transition or not at all. Status mutations are
/// guarded by `JobStatus::can_transition_to`.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: &Job) -> Result<(), StoreError>;

    async fn find(&self, id: JobId) -> Result<Option<Job>, StoreError>;

    async fn find_by_task_ref(&self, task_ref: &str) -> Result<Option<Job>, StoreError>;

    /// Atomically claim the oldest job in `from`, transitioning it to
    /// `to`. Rows locked by a concurrent claim are skipped, not waited
    /// on. `Ok(None)` means nothing eligible, not an error.
    async fn claim_next(
        &self,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError>;

    /// Atomically claim the oldest `audio_pending` job and debit its
    /// owner by `price`. On insufficient balance the job is failed in
    /// the same transaction with no charge.
    async fn claim_next_audio(&self, price: i64) -> Result<AudioClaim, StoreError>;

    /// Persist generated lyrics and transition to `lyrics_complete`.
    /// Guarded on the job still being `lyrics_processing`.
    async fn store_lyrics(&self, id: JobId, lyrics: &str) -> Result<bool, StoreError>;

    /// Compare-and-set status transition. Returns `false` when the job
    /// is missing or no longer in `from`.
    async fn transition(
        &self,
        id: JobId,
        from: JobStatus,
        to: JobStatus,
        error_message: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Record the external task id and advance to `processing`.
    /// The task ref is write-once: a differing existing value is a
    /// constraint violation, a matching one is a no-op confirm.
    async fn store_task_ref(&self, id: JobId, task_ref: &str) -> Result<bool, StoreError>;

    /// Transition the job out of one of `from` into `to` and credit
    /// its owner `refund`, as one atomic unit. Returns `false` (and
    /// credits nothing) when the job is missing or not in `from`; this
    /// is the at-most-once refund guard.
    async fn settle_with_refund(
        &self,
        id: JobId,
        from: &[JobStatus],
        to: JobStatus,
        refund: i64,
        error_message: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Persist the artifact URL and transition `processing → complete`.
    /// Returns `false` when the job is missing or not in `processing`.
    async fn complete(&self, id: JobId, artifact_url: &str) -> Result<bool, StoreError>;

    /// Delete a job row. Callers enforce ownership and terminality.
    async fn delete(&self, id: JobId) -> Result<bool, StoreError>;
}
