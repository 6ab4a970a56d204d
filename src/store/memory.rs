//! In-process store.
//!
//! Each account has its own `tokio::sync::Mutex`, kept in a `DashMap` so
//! units of work touching different accounts never contend. A unit of work
//! holds the owned guards of every account it lock-loaded and stages its
//! writes privately; `commit` applies them to the shared state in one step
//! and releases the guards. Dropping the unit of work discards the staged
//! writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    error::AppError,
    models::{
        account::{Account, AccountOverview},
        card::{Card, CardKind},
        transaction::{NewTransaction, Transaction},
        user::User,
    },
    store::{Store, UnitOfWork},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<i64, User>,
    accounts: BTreeMap<String, Account>,
    /// Keyed by card number
    cards: HashMap<String, Card>,
    /// Append order
    transactions: Vec<Transaction>,
}

type AccountLocks = DashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    locks: Arc<AccountLocks>,
    lock_timeout: Duration,
}

impl MemoryStore {
    pub fn new(
        lock_timeout: Duration,
        users: Vec<User>,
        accounts: Vec<Account>,
        cards: Vec<Card>,
    ) -> Self {
        let locks = AccountLocks::new();
        for account in &accounts {
            locks.insert(account.account_id.clone(), Arc::new(Mutex::new(())));
        }

        let state = MemoryState {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            accounts: accounts
                .into_iter()
                .map(|a| (a.account_id.clone(), a))
                .collect(),
            cards: cards
                .into_iter()
                .map(|c| (c.card_number.clone(), c))
                .collect(),
            transactions: Vec::new(),
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            locks: Arc::new(locks),
            lock_timeout,
        }
    }

    /// Store preloaded with the same demo accounts as the database seed
    /// migration.
    pub fn demo(lock_timeout: Duration) -> Self {
        let now = Utc::now();
        let expiry = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap_or(now.date_naive());

        let user = |id: i64, first: &str, last: &str, phone: &str| User {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
            phone_number: phone.to_string(),
            created_at: now,
            updated_at: now,
        };
        let account = |id: &str, number: &str, user_id: i64, balance: Decimal| Account {
            account_id: id.to_string(),
            account_number: number.to_string(),
            user_id,
            balance,
            active: true,
            created_at: now,
            updated_at: now,
        };
        let card = |number: &str, kind: CardKind, account_id: &str| Card {
            card_number: number.to_string(),
            card_kind: kind,
            account_id: account_id.to_string(),
            expiry_date: expiry,
            active: true,
        };

        let users = vec![
            user(1, "John", "Doe", "+31612345678"),
            user(2, "Jane", "Smith", "+31623456789"),
            user(3, "Bob", "Johnson", "+31634567890"),
        ];
        let accounts = vec![
            account("ACC001", "NL91RABO0417164300", 1, Decimal::new(100_000, 2)),
            account("ACC002", "NL91RABO0417164301", 2, Decimal::new(50_000, 2)),
            account("ACC003", "NL91RABO0417164302", 3, Decimal::new(250_000, 2)),
        ];
        let cards = vec![
            card("4111111111111111", CardKind::Debit, "ACC001"),
            card("5555555555554444", CardKind::Credit, "ACC002"),
            card("4000056655665556", CardKind::Debit, "ACC003"),
        ];

        for user in &users {
            tracing::debug!(user = %user.full_name(), "Seeding demo user");
        }

        Self::new(lock_timeout, users, accounts, cards)
    }

    /// Committed state of one account.
    #[cfg(test)]
    pub(crate) async fn account(&self, account_id: &str) -> Option<Account> {
        self.state.read().await.accounts.get(account_id).cloned()
    }

    /// Number of committed ledger entries.
    #[cfg(test)]
    pub(crate) async fn ledger_len(&self) -> usize {
        self.state.read().await.transactions.len()
    }

    /// Hold an account's lock from outside any unit of work.
    #[cfg(test)]
    pub(crate) async fn hold_lock(&self, account_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get(account_id)
            .map(|entry| Arc::clone(entry.value()))
            .expect("account exists");
        lock.lock_owned().await
    }
}

#[async_trait]
impl Store for MemoryStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, AppError> {
        Ok(MemoryUnitOfWork {
            state: Arc::clone(&self.state),
            locks: Arc::clone(&self.locks),
            lock_timeout: self.lock_timeout,
            guards: HashMap::new(),
            staged_accounts: HashMap::new(),
            staged_transactions: Vec::new(),
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn active_account_overviews(&self) -> Result<Vec<AccountOverview>, AppError> {
        let state = self.state.read().await;

        state
            .accounts
            .values()
            .filter(|account| account.active)
            .map(|account| {
                let user = state.users.get(&account.user_id).ok_or_else(|| {
                    AppError::Internal(format!(
                        "account {} references missing user {}",
                        account.account_id, account.user_id
                    ))
                })?;
                let card = state
                    .cards
                    .values()
                    .find(|card| card.account_id == account.account_id);

                Ok(AccountOverview {
                    account_id: account.account_id.clone(),
                    account_number: account.account_number.clone(),
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    email: user.email.clone(),
                    balance: account.balance,
                    active: account.active,
                    card_kind: card.map(|c| c.card_kind),
                    card_number: card.map(|c| c.card_number.clone()),
                })
            })
            .collect()
    }

    async fn find_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.transaction_id == transaction_id)
            .cloned())
    }

    async fn transactions_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<Transaction>, AppError> {
        let state = self.state.read().await;
        Ok(newest_first(
            state.transactions.iter().filter(|t| t.account_id == account_id),
        ))
    }

    async fn transactions_for_account_between(
        &self,
        account_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AppError> {
        let state = self.state.read().await;
        Ok(newest_first(state.transactions.iter().filter(|t| {
            t.account_id == account_id && t.created_at >= from && t.created_at <= to
        })))
    }
}

fn newest_first<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> Vec<Transaction> {
    // Walk append order backwards so entries sharing a timestamp stay newest first
    let mut selected: Vec<Transaction> = transactions.cloned().collect();
    selected.reverse();
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    selected
}

pub struct MemoryUnitOfWork {
    state: Arc<RwLock<MemoryState>>,
    locks: Arc<AccountLocks>,
    lock_timeout: Duration,
    guards: HashMap<String, OwnedMutexGuard<()>>,
    staged_accounts: HashMap<String, Account>,
    staged_transactions: Vec<Transaction>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn load_for_update(&mut self, account_id: &str) -> Result<Account, AppError> {
        if !self.guards.contains_key(account_id) {
            // Clone the Arc so no DashMap shard lock is held across the await
            let lock = self
                .locks
                .get(account_id)
                .map(|entry| Arc::clone(entry.value()))
                .ok_or_else(|| AppError::AccountNotFound {
                    account_id: account_id.to_string(),
                })?;

            let guard = tokio::time::timeout(self.lock_timeout, lock.lock_owned())
                .await
                .map_err(|_| AppError::LockTimeout {
                    account_id: account_id.to_string(),
                })?;
            self.guards.insert(account_id.to_string(), guard);
        }

        if let Some(staged) = self.staged_accounts.get(account_id) {
            return Ok(staged.clone());
        }

        self.state
            .read()
            .await
            .accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| AppError::AccountNotFound {
                account_id: account_id.to_string(),
            })
    }

    async fn find_card_by_number(&mut self, card_number: &str) -> Result<Option<Card>, AppError> {
        Ok(self.state.read().await.cards.get(card_number).cloned())
    }

    async fn persist(&mut self, account: &mut Account) -> Result<(), AppError> {
        if !self.guards.contains_key(&account.account_id) {
            return Err(AppError::Internal(format!(
                "account {} persisted without holding its lock",
                account.account_id
            )));
        }

        account.updated_at = Utc::now();
        self.staged_accounts
            .insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn transaction_exists(&mut self, transaction_id: &str) -> Result<bool, AppError> {
        if self
            .staged_transactions
            .iter()
            .any(|t| t.transaction_id == transaction_id)
        {
            return Ok(true);
        }

        Ok(self
            .state
            .read()
            .await
            .transactions
            .iter()
            .any(|t| t.transaction_id == transaction_id))
    }

    async fn append(&mut self, transaction: NewTransaction) -> Result<Transaction, AppError> {
        let transaction = transaction.into_transaction(Utc::now());
        self.staged_transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn commit(mut self) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        for (account_id, account) in self.staged_accounts.drain() {
            state.accounts.insert(account_id, account);
        }
        state.transactions.append(&mut self.staged_transactions);

        drop(state);
        // Guards are released when `self` drops here
        Ok(())
    }
}
