use async_trait::async_trait;

use crate::domain::AccountId;

use super::StoreError;

/// Per-account credit balance with atomic debit/credit primitives.
/// Account provisioning belongs to the billing collaborator; this
/// core only reads and mutates balances.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn balance(&self, account: AccountId) -> Result<i64, StoreError>;

    /// Debit `amount` iff the balance covers it. Returns `false` on
    /// insufficient balance, leaving the balance untouched.
    async fn debit_if_sufficient(
        &self,
        account: AccountId,
        amount: i64,
    ) -> Result<bool, StoreError>;

    async fn credit(&self, account: AccountId, amount: i64) -> Result<(), StoreError>;
}
