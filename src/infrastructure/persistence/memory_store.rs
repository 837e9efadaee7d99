use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::{AudioClaim, JobStore, Ledger, StoreError};
use crate::domain::{AccountId, Job, JobId, JobStatus};

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    accounts: HashMap<Uuid, i64>,
}

/// In-memory `JobStore` + `Ledger` with the same atomicity contract
/// as the Postgres store: every method runs under one mutex, so a
/// claim and its ledger mutation are indivisible and concurrent
/// claimers can never take the same row. Backs the integration tests
/// and local runs without Postgres.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/bootstrap helper; account provisioning is otherwise the
    /// billing collaborator's job.
    pub fn put_account(&self, account: AccountId, balance: i64) {
        self.lock().accounts.insert(account.as_uuid(), balance);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn oldest_with_status(inner: &Inner, status: JobStatus) -> Option<Uuid> {
        inner
            .jobs
            .values()
            .filter(|j| j.status == status)
            .min_by_key(|j| (j.created_at, j.id.as_uuid()))
            .map(|j| j.id.as_uuid())
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.jobs.contains_key(&job.id.as_uuid()) {
            return Err(StoreError::ConstraintViolation(format!(
                "duplicate job id {}",
                job.id.as_uuid()
            )));
        }
        inner.jobs.insert(job.id.as_uuid(), job.clone());
        Ok(())
    }

    async fn find(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.lock().jobs.get(&id.as_uuid()).cloned())
    }

    async fn find_by_task_ref(&self, task_ref: &str) -> Result<Option<Job>, StoreError> {
        Ok(self
            .lock()
            .jobs
            .values()
            .find(|j| j.task_ref.as_deref() == Some(task_ref))
            .cloned())
    }

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

        let mut inner = self.lock();
        let Some(id) = Self::oldest_with_status(&inner, from) else {
            return Ok(None);
        };
        let job = inner.jobs.get_mut(&id).ok_or_else(|| {
            StoreError::QueryFailed("claimed job vanished".to_string())
        })?;
        job.status = to;
        job.updated_at = Utc::now();
        Ok(Some(job.clone()))
    }

    async fn claim_next_audio(&self, price: i64) -> Result<AudioClaim, StoreError> {
        let mut inner = self.lock();
        let Some(id) = Self::oldest_with_status(&inner, JobStatus::AudioPending) else {
            return Ok(AudioClaim::Idle);
        };

        let account_id = match inner.jobs.get(&id) {
            Some(job) => job.account_id.as_uuid(),
            None => return Ok(AudioClaim::Idle),
        };
        let balance = inner.accounts.get(&account_id).copied().unwrap_or(0);
        let sufficient = balance >= price;
        if sufficient {
            inner.accounts.insert(account_id, balance - price);
        }

        let job = inner.jobs.get_mut(&id).ok_or_else(|| {
            StoreError::QueryFailed("claimed job vanished".to_string())
        })?;
        if sufficient {
            job.status = JobStatus::AudioProcessing;
            job.updated_at = Utc::now();
            Ok(AudioClaim::Claimed {
                job: job.clone(),
                pre_debit_balance: balance,
            })
        } else {
            job.status = JobStatus::Error;
            job.error_message = Some("insufficient credits at audio claim".to_string());
            job.updated_at = Utc::now();
            Ok(AudioClaim::InsufficientCredits(job.clone()))
        }
    }

    async fn store_lyrics(&self, id: JobId, lyrics: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id.as_uuid()) else {
            return Ok(false);
        };
        if job.status != JobStatus::LyricsProcessing {
            return Ok(false);
        }
        job.lyrics = Some(lyrics.to_string());
        job.status = JobStatus::LyricsComplete;
        job.updated_at = Utc::now();
        Ok(true)
    }

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

        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id.as_uuid()) else {
            return Ok(false);
        };
        if job.status != from {
            return Ok(false);
        }
        job.status = to;
        if let Some(msg) = error_message {
            job.error_message = Some(msg.to_string());
        }
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn store_task_ref(&self, id: JobId, task_ref: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id.as_uuid()) else {
            return Ok(false);
        };
        if let Some(existing) = &job.task_ref {
            if existing != task_ref {
                return Err(StoreError::ConstraintViolation(format!(
                    "task ref already set to {existing}"
                )));
            }
        }
        if job.status != JobStatus::AudioProcessing {
            return Ok(false);
        }
        job.task_ref = Some(task_ref.to_string());
        job.status = JobStatus::Processing;
        job.updated_at = Utc::now();
        Ok(true)
    }

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

        let mut inner = self.lock();
        let account_id = {
            let Some(job) = inner.jobs.get_mut(&id.as_uuid()) else {
                return Ok(false);
            };
            if !from.contains(&job.status) {
                return Ok(false);
            }
            job.status = to;
            if let Some(msg) = error_message {
                job.error_message = Some(msg.to_string());
            }
            job.updated_at = Utc::now();
            job.account_id.as_uuid()
        };

        *inner.accounts.entry(account_id).or_insert(0) += refund;
        Ok(true)
    }

    async fn complete(&self, id: JobId, artifact_url: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id.as_uuid()) else {
            return Ok(false);
        };
        if job.status != JobStatus::Processing {
            return Ok(false);
        }
        job.artifact_url = Some(artifact_url.to_string());
        job.status = JobStatus::Complete;
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: JobId) -> Result<bool, StoreError> {
        Ok(self.lock().jobs.remove(&id.as_uuid()).is_some())
    }
}

#[async_trait]
impl Ledger for InMemoryStore {
    async fn balance(&self, account: AccountId) -> Result<i64, StoreError> {
        self.lock()
            .accounts
            .get(&account.as_uuid())
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("account {}", account.as_uuid())))
    }

    async fn debit_if_sufficient(
        &self,
        account: AccountId,
        amount: i64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let balance = inner
            .accounts
            .get_mut(&account.as_uuid())
            .ok_or_else(|| StoreError::NotFound(format!("account {}", account.as_uuid())))?;
        if *balance < amount {
            return Ok(false);
        }
        *balance -= amount;
        Ok(true)
    }

    async fn credit(&self, account: AccountId, amount: i64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let balance = inner
            .accounts
            .get_mut(&account.as_uuid())
            .ok_or_else(|| StoreError::NotFound(format!("account {}", account.as_uuid())))?;
        *balance += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn debit_only_applies_when_the_balance_covers_it() {
        let store = InMemoryStore::new();
        let account = AccountId::new();
        store.put_account(account, 2);

        assert!(store.debit_if_sufficient(account, 2).await.unwrap());
        assert_eq!(store.balance(account).await.unwrap(), 0);

        assert!(!store.debit_if_sufficient(account, 1).await.unwrap());
        assert_eq!(store.balance(account).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn credit_restores_a_debited_balance() {
        let store = InMemoryStore::new();
        let account = AccountId::new();
        store.put_account(account, 5);

        assert!(store.debit_if_sufficient(account, 3).await.unwrap());
        store.credit(account, 3).await.unwrap();
        assert_eq!(store.balance(account).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn ledger_calls_for_an_unknown_account_report_not_found() {
        let store = InMemoryStore::new();
        let account = AccountId::new();

        assert!(matches!(
            store.balance(account).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.debit_if_sufficient(account, 1).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.credit(account, 1).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
