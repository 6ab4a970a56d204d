//! Storage seam for the transaction processor.
//!
//! The processor never talks to a database directly. It opens a
//! [`UnitOfWork`] from a [`Store`], lock-loads the accounts it needs, and
//! either commits everything it staged or drops the unit of work, which
//! discards every change and releases every lock.
//!
//! Two implementations exist:
//! - [`postgres::PgStore`]: row locks via `SELECT ... FOR UPDATE` with a
//!   transaction-scoped `lock_timeout`
//! - [`memory::MemoryStore`]: in-process keyed mutexes with a bounded wait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        account::{Account, AccountOverview},
        card::Card,
        transaction::{NewTransaction, Transaction},
    },
};

pub mod memory;
pub mod postgres;

/// Read-only access to accounts and the ledger, plus the entry point for
/// units of work.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type UnitOfWork: UnitOfWork;

    /// Start a new unit of work. Nothing is locked yet.
    async fn begin(&self) -> Result<Self::UnitOfWork, AppError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), AppError>;

    /// Active accounts joined with holder and card. Takes no locks.
    async fn active_account_overviews(&self) -> Result<Vec<AccountOverview>, AppError>;

    async fn find_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, AppError>;

    /// Ledger entries paid from `account_id`, newest first.
    async fn transactions_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<Transaction>, AppError>;

    /// Ledger entries paid from `account_id` created within `[from, to]`,
    /// newest first.
    async fn transactions_for_account_between(
        &self,
        account_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AppError>;
}

/// One atomic withdraw or transfer.
///
/// Locks taken by [`UnitOfWork::load_for_update`] are held until the unit of
/// work is committed or dropped. Dropping without commit rolls back.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Load an account and take its exclusive lock.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound`: no such account
    /// - `LockTimeout`: the lock was not acquired within the configured wait
    async fn load_for_update(&mut self, account_id: &str) -> Result<Account, AppError>;

    async fn find_card_by_number(&mut self, card_number: &str) -> Result<Option<Card>, AppError>;

    /// Stage the account's balance and bump its `updated_at`.
    async fn persist(&mut self, account: &mut Account) -> Result<(), AppError>;

    async fn transaction_exists(&mut self, transaction_id: &str) -> Result<bool, AppError>;

    /// Append a ledger entry, stamping its creation time.
    async fn append(&mut self, transaction: NewTransaction) -> Result<Transaction, AppError>;

    /// Make every staged change visible and release all locks.
    async fn commit(self) -> Result<(), AppError>;
}
