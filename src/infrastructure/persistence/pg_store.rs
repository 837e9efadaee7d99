use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{AudioClaim, JobStore, Ledger, StoreError};
use crate::domain::{AccountId, Job, JobId, JobStatus};

const JOB_COLUMNS: &str = "id, account_id, title, description, style_preset, style_custom, \
     tone, language, status, lyrics, task_ref, artifact_url, error_message, \
     created_at, updated_at";

/// Postgres-backed `JobStore` + `Ledger`. Claims use
/// `FOR UPDATE SKIP LOCKED` so overlapping dequeue invocations skip
/// rows another claimer holds instead of waiting, and ledger
/// mutations commit in the same transaction as the status transition
/// they accompany.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    account_id: Uuid,
    title: String,
    description: String,
    style_preset: Option<String>,
    style_custom: Option<String>,
    tone: Option<String>,
    language: Option<String>,
    status: String,
    lyrics: Option<String>,
    task_ref: Option<String>,
    artifact_url: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl JobRow {
    fn into_domain(self) -> Result<Job, StoreError> {
        let status = self
            .status
            .parse::<JobStatus>()
            .map_err(StoreError::QueryFailed)?;
        Ok(Job {
            id: JobId::from_uuid(self.id),
            account_id: AccountId::from_uuid(self.account_id),
            title: self.title,
            description: self.description,
            style_preset: self.style_preset,
            style_custom: self.style_custom,
            tone: self.tone,
            language: self.language,
            status,
            lyrics: self.lyrics,
            task_ref: self.task_ref,
            artifact_url: self.artifact_url,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn query_err(e: sqlx::Error) -> StoreError {
    StoreError::QueryFailed(e.to_string())
}

#[async_trait]
impl JobStore for PgStore {
    #[instrument(skip(self, job), fields(job_id = %job.id.as_uuid()))]
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO jobs (id, account_id, title, description, style_preset, \
             style_custom, tone, language, status, lyrics, task_ref, artifact_url, \
             error_message, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(job.id.as_uuid())
        .bind(job.account_id.as_uuid())
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.style_preset)
        .bind(&job.style_custom)
        .bind(&job.tone)
        .bind(&job.language)
        .bind(job.status.as_str())
        .bind(&job.lyrics)
        .bind(&job.task_ref)
        .bind(&job.artifact_url)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn find(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(query_err)?;

        row.map(JobRow::into_domain).transpose()
    }

    #[instrument(skip(self, task_ref))]
    async fn find_by_task_ref(&self, task_ref: &str) -> Result<Option<Job>, StoreError> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE task_ref = $1"))
                .bind(task_ref)
                .fetch_optional(&self.pool)
                .await
                .map_err(query_err)?;

        row.map(JobRow::into_domain).transpose()
    }

    #[instrument(skip(self), fields(from = %from, to = %to))]
    async fn claim_next(
        &self,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError> {
        if !from.can_transition_to(to) {
            return Err(StoreError::ConstraintViolation(format!(
                "claim transition {} -> {} not allowed",
                from, to
            )));
        }

        let row: Option<JobRow> = sqlx::query_as(&format!(
            "UPDATE jobs SET status = $1, updated_at = now() \
             WHERE id = (SELECT id FROM jobs WHERE status = $2 \
                         ORDER BY created_at, id LIMIT 1 \
                         FOR UPDATE SKIP LOCKED) \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(to.as_str())
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?;

        row.map(JobRow::into_domain).transpose()
    }

    #[instrument(skip(self))]
    async fn claim_next_audio(&self, price: i64) -> Result<AudioClaim, StoreError> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        let row: Option<JobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = $1 \
             ORDER BY created_at, id LIMIT 1 \
             FOR UPDATE SKIP LOCKED"
        ))
        .bind(JobStatus::AudioPending.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?;

        let Some(row) = row else {
            tx.commit().await.map_err(query_err)?;
            return Ok(AudioClaim::Idle);
        };

        let balance_after: Option<i64> = sqlx::query_scalar(
            "UPDATE accounts SET balance = balance - $1, updated_at = now() \
             WHERE id = $2 AND balance >= $1 RETURNING balance",
        )
        .bind(price)
        .bind(row.account_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?;
        let debited = balance_after.is_some();

        let next_status = if debited {
            JobStatus::AudioProcessing
        } else {
            JobStatus::Error
        };
        let error_message = if debited {
            None
        } else {
            Some("insufficient credits at audio claim")
        };

        let updated: JobRow = sqlx::query_as(&format!(
            "UPDATE jobs SET status = $1, error_message = COALESCE($2, error_message), \
             updated_at = now() WHERE id = $3 RETURNING {JOB_COLUMNS}"
        ))
        .bind(next_status.as_str())
        .bind(error_message)
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        let job = updated.into_domain()?;
        match balance_after {
            Some(after) => Ok(AudioClaim::Claimed {
                job,
                pre_debit_balance: after + price,
            }),
            None => Ok(AudioClaim::InsufficientCredits(job)),
        }
    }

    #[instrument(skip(self, lyrics), fields(job_id = %id.as_uuid()))]
    async fn store_lyrics(&self, id: JobId, lyrics: &str) -> Result<bool, StoreError> {
        let affected = sqlx::query(
            "UPDATE jobs SET lyrics = $1, status = $2, updated_at = now() \
             WHERE id = $3 AND status = $4",
        )
        .bind(lyrics)
        .bind(JobStatus::LyricsComplete.as_str())
        .bind(id.as_uuid())
        .bind(JobStatus::LyricsProcessing.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_err)?
        .rows_affected();

        Ok(affected == 1)
    }

    #[instrument(skip(self, error_message), fields(job_id = %id.as_uuid(), from = %from, to = %to))]
    async fn transition(
        &self,
        id: JobId,
        from: JobStatus,
        to: JobStatus,
        error_message: Option<&str>,
    ) -> Result<bool, StoreError> {
        if !from.can_transition_to(to) {
            return Err(StoreError::ConstraintViolation(format!(
                "transition {} -> {} not allowed",
                from, to
            )));
        }

        let affected = sqlx::query(
            "UPDATE jobs SET status = $1, error_message = COALESCE($2, error_message), \
             updated_at = now() WHERE id = $3 AND status = $4",
        )
        .bind(to.as_str())
        .bind(error_message)
        .bind(id.as_uuid())
        .bind(from.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_err)?
        .rows_affected();

        Ok(affected == 1)
    }

    #[instrument(skip(self, task_ref), fields(job_id = %id.as_uuid()))]
    async fn store_task_ref(&self, id: JobId, task_ref: &str) -> Result<bool, StoreError> {
        let affected = sqlx::query(
            "UPDATE jobs SET task_ref = $1, status = $2, updated_at = now() \
             WHERE id = $3 AND status = $4 AND (task_ref IS NULL OR task_ref = $1)",
        )
        .bind(task_ref)
        .bind(JobStatus::Processing.as_str())
        .bind(id.as_uuid())
        .bind(JobStatus::AudioProcessing.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_err)?
        .rows_affected();

        if affected == 1 {
            return Ok(true);
        }

        // Distinguish a lost status race from an attempt to overwrite
        // the write-once task ref.
        if let Some(existing) = self.find(id).await? {
            if let Some(stored) = existing.task_ref {
                if stored != task_ref {
                    return Err(StoreError::ConstraintViolation(format!(
                        "task ref already set to {stored}"
                    )));
                }
            }
        }
        Ok(false)
    }

    #[instrument(skip(self, error_message), fields(job_id = %id.as_uuid(), to = %to))]
    async fn settle_with_refund(
        &self,
        id: JobId,
        from: &[JobStatus],
        to: JobStatus,
        refund: i64,
        error_message: Option<&str>,
    ) -> Result<bool, StoreError> {
        for status in from {
            if !status.can_transition_to(to) {
                return Err(StoreError::ConstraintViolation(format!(
                    "transition {} -> {} not allowed",
                    status, to
                )));
            }
        }
        let from_strs: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        let mut tx = self.pool.begin().await.map_err(query_err)?;

        let settled: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE jobs SET status = $1, error_message = COALESCE($2, error_message), \
             updated_at = now() WHERE id = $3 AND status = ANY($4) \
             RETURNING account_id",
        )
        .bind(to.as_str())
        .bind(error_message)
        .bind(id.as_uuid())
        .bind(&from_strs)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?;

        let Some((account_id,)) = settled else {
            tx.commit().await.map_err(query_err)?;
            return Ok(false);
        };

        sqlx::query("UPDATE accounts SET balance = balance + $1, updated_at = now() WHERE id = $2")
            .bind(refund)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(true)
    }

    #[instrument(skip(self, artifact_url), fields(job_id = %id.as_uuid()))]
    async fn complete(&self, id: JobId, artifact_url: &str) -> Result<bool, StoreError> {
        let affected = sqlx::query(
            "UPDATE jobs SET status = $1, artifact_url = $2, updated_at = now() \
             WHERE id = $3 AND status = $4",
        )
        .bind(JobStatus::Complete.as_str())
        .bind(artifact_url)
        .bind(id.as_uuid())
        .bind(JobStatus::Processing.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_err)?
        .rows_affected();

        Ok(affected == 1)
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn delete(&self, id: JobId) -> Result<bool, StoreError> {
        let affected = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(query_err)?
            .rows_affected();

        Ok(affected == 1)
    }
}

#[async_trait]
impl Ledger for PgStore {
    #[instrument(skip(self), fields(account_id = %account.as_uuid()))]
    async fn balance(&self, account: AccountId) -> Result<i64, StoreError> {
        let balance: Option<i64> = sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1")
            .bind(account.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;

        balance.ok_or_else(|| StoreError::NotFound(format!("account {}", account.as_uuid())))
    }

    #[instrument(skip(self), fields(account_id = %account.as_uuid()))]
    async fn debit_if_sufficient(
        &self,
        account: AccountId,
        amount: i64,
    ) -> Result<bool, StoreError> {
        let affected = sqlx::query(
            "UPDATE accounts SET balance = balance - $1, updated_at = now() \
             WHERE id = $2 AND balance >= $1",
        )
        .bind(amount)
        .bind(account.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_err)?
        .rows_affected();

        if affected == 1 {
            return Ok(true);
        }
        // Insufficient balance and missing account both affect zero
        // rows; report the latter distinctly.
        self.balance(account).await.map(|_| false)
    }

    #[instrument(skip(self), fields(account_id = %account.as_uuid()))]
    async fn credit(&self, account: AccountId, amount: i64) -> Result<(), StoreError> {
        let affected =
            sqlx::query("UPDATE accounts SET balance = balance + $1, updated_at = now() WHERE id = $2")
                .bind(amount)
                .bind(account.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(query_err)?
                .rows_affected();

        if affected == 1 {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!(
                "account {}",
                account.as_uuid()
            )))
        }
    }
}
