//! Transaction service - Core business logic for withdrawals and transfers.
//!
//! This service handles:
//! - Per-account locking through the store's unit of work
//! - Card validation and fee strategy selection
//! - Balance checks against the fee-inclusive total
//! - Ledger entry creation
//!
//! # Atomicity Guarantees
//!
//! Each operation runs in one unit of work. Any error returned before
//! `commit` drops the unit of work, which discards every balance change and
//! releases every lock. Nothing is retried here; lock timeouts and
//! insufficient funds go straight back to the caller.
//!
//! # Lock Ordering
//!
//! Transfers lock both accounts in ascending account id order, regardless of
//! direction, so two opposite transfers between the same pair cannot
//! deadlock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        account::Account,
        card::CardKind,
        transaction::{
            HistoryQuery, NewTransaction, Transaction, TransactionResponse, TransactionStatus,
            TransactionType, TransferRequest, WithdrawRequest,
        },
    },
    services::{card_validator::validate_card, fee_strategy::FeeStrategy},
    store::{Store, UnitOfWork},
};

/// Attempts at generating a ledger id not already in use.
const MAX_ID_ATTEMPTS: usize = 3;

pub struct TransactionService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for TransactionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// Fee breakdown for one operation.
struct Charge {
    fee: Decimal,
    total: Decimal,
}

impl<S: Store> TransactionService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Withdraw money from an account with one of its cards.
    ///
    /// # Process
    ///
    /// 1. Lock-load the account
    /// 2. Validate the card against it
    /// 3. Compute fee and total from the card's fee strategy
    /// 4. Check the balance covers the total
    /// 5. Debit the total and persist the account
    /// 6. Append a `WITHDRAWAL` ledger entry
    /// 7. Commit
    ///
    /// # Errors
    ///
    /// - `AccountNotFound`, `LockTimeout`: from the lock-load
    /// - `CardNotFound`, `CardMismatch`, `CardUnusable`: card validation
    /// - `InvalidAmount`: amount is zero or negative
    /// - `InsufficientFunds`: balance is lower than amount + fee
    pub async fn withdraw(&self, request: WithdrawRequest) -> Result<TransactionResponse, AppError> {
        tracing::info!(
            account_id = %request.account_id,
            amount = %request.amount,
            "Processing withdrawal"
        );

        let mut uow = self.store.begin().await?;

        let mut account = uow.load_for_update(&request.account_id).await?;
        let card = validate_card(&mut uow, &request.card_number, &account, today()).await?;
        let charge = charge_for(card.card_kind, request.amount)?;
        ensure_funds(&account, charge.total)?;

        let balance_before = account.balance;
        account.withdraw(charge.total)?;
        let balance_after = account.balance;

        uow.persist(&mut account).await?;

        let transaction_id = next_transaction_id(&mut uow).await?;
        let transaction = uow
            .append(NewTransaction {
                transaction_id,
                account_id: account.account_id.clone(),
                to_account_id: None,
                transaction_type: TransactionType::Withdrawal,
                amount: request.amount,
                fee: charge.fee,
                total_amount: charge.total,
                card_kind: card.card_kind,
                balance_before,
                balance_after,
                description: request.description,
                status: TransactionStatus::Success,
            })
            .await?;

        uow.commit().await?;

        tracing::info!(
            summary = %transaction.summary(),
            balance = %account.formatted_balance(),
            "Withdrawal successful"
        );

        Ok(transaction.into())
    }

    /// Transfer money between two accounts, paid with a card of the source
    /// account.
    ///
    /// The source is debited `amount + fee`; the destination is credited
    /// `amount`. The fee is not forwarded anywhere.
    ///
    /// # Errors
    ///
    /// - `InvalidTransaction`: source and destination are the same account,
    ///   raised before anything is loaded
    /// - Everything [`TransactionService::withdraw`] can return
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransactionResponse, AppError> {
        tracing::info!(
            from = %request.from_account_id,
            to = %request.to_account_id,
            amount = %request.amount,
            "Processing transfer"
        );

        if request.from_account_id == request.to_account_id {
            return Err(AppError::InvalidTransaction(
                "Cannot transfer to the same account".to_string(),
            ));
        }

        let mut uow = self.store.begin().await?;

        let (mut from_account, mut to_account) =
            lock_pair(&mut uow, &request.from_account_id, &request.to_account_id).await?;

        let card = validate_card(&mut uow, &request.card_number, &from_account, today()).await?;
        let charge = charge_for(card.card_kind, request.amount)?;
        ensure_funds(&from_account, charge.total)?;

        let balance_before = from_account.balance;
        from_account.withdraw(charge.total)?;
        to_account.deposit(request.amount)?;
        let balance_after = from_account.balance;

        uow.persist(&mut from_account).await?;
        uow.persist(&mut to_account).await?;

        let transaction_id = next_transaction_id(&mut uow).await?;
        let transaction = uow
            .append(NewTransaction {
                transaction_id,
                account_id: from_account.account_id.clone(),
                to_account_id: Some(to_account.account_id.clone()),
                transaction_type: TransactionType::Transfer,
                amount: request.amount,
                fee: charge.fee,
                total_amount: charge.total,
                card_kind: card.card_kind,
                balance_before,
                balance_after,
                description: request.description,
                status: TransactionStatus::Success,
            })
            .await?;

        uow.commit().await?;

        tracing::info!(
            summary = %transaction.summary(),
            balance = %from_account.formatted_balance(),
            "Transfer successful"
        );

        Ok(transaction.into())
    }

    /// Get a ledger entry by id.
    pub async fn get_transaction(&self, transaction_id: &str) -> Result<TransactionResponse, AppError> {
        let transaction = self
            .store
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound {
                transaction_id: transaction_id.to_string(),
            })?;

        if !transaction.is_successful() {
            tracing::debug!(summary = %transaction.summary(), "Returning unsuccessful entry");
        }

        Ok(transaction.into())
    }

    /// Ledger entries paid from an account, newest first.
    ///
    /// Without bounds the whole history is returned; a missing `from` means
    /// the Unix epoch and a missing `to` means now.
    pub async fn account_history(
        &self,
        account_id: &str,
        query: HistoryQuery,
    ) -> Result<Vec<TransactionResponse>, AppError> {
        let transactions: Vec<Transaction> = match (query.from, query.to) {
            (None, None) => self.store.transactions_for_account(account_id).await?,
            (from, to) => {
                let from = from.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                let to = to.unwrap_or_else(Utc::now);
                if from > to {
                    return Err(AppError::InvalidRequest(
                        "History range start is after its end".to_string(),
                    ));
                }
                self.store
                    .transactions_for_account_between(account_id, from, to)
                    .await?
            }
        };

        Ok(transactions.into_iter().map(Into::into).collect())
    }
}

fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}

fn charge_for(card_kind: CardKind, amount: Decimal) -> Result<Charge, AppError> {
    let strategy = FeeStrategy::for_card(card_kind);
    let fee = strategy.calculate_fee(amount)?;
    let total = strategy.calculate_total_amount(amount)?;

    tracing::debug!(strategy = strategy.name(), %fee, %total, "Fee computed");

    Ok(Charge { fee, total })
}

fn ensure_funds(account: &Account, total: Decimal) -> Result<(), AppError> {
    if !account.has_sufficient_funds(total) {
        return Err(AppError::InsufficientFunds {
            account_id: account.account_id.clone(),
            available_balance: account.balance,
            requested_amount: total,
        });
    }
    Ok(())
}

/// Lock both accounts in ascending id order; returns `(from, to)`.
async fn lock_pair<U: UnitOfWork>(
    uow: &mut U,
    from_account_id: &str,
    to_account_id: &str,
) -> Result<(Account, Account), AppError> {
    if from_account_id < to_account_id {
        let from = uow.load_for_update(from_account_id).await?;
        let to = uow.load_for_update(to_account_id).await?;
        Ok((from, to))
    } else {
        let to = uow.load_for_update(to_account_id).await?;
        let from = uow.load_for_update(from_account_id).await?;
        Ok((from, to))
    }
}

async fn next_transaction_id<U: UnitOfWork>(uow: &mut U) -> Result<String, AppError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = format!("TXN-{}", Uuid::new_v4());
        if !uow.transaction_exists(&candidate).await? {
            return Ok(candidate);
        }
        tracing::warn!(transaction_id = %candidate, "Generated transaction id already in use");
    }

    Err(AppError::Internal(
        "could not generate a unique transaction id".to_string(),
    ))
}
