//! Read-only account queries.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    error::AppError,
    models::account::{AccountBalanceResponse, AllAccountsBalanceResponse},
    store::Store,
};

pub struct AccountService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> AccountService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Balance of every active account, with owner and masked card.
    ///
    /// Takes no locks, so balances may be mid-flight relative to each other.
    /// An empty listing has a total balance of `0.00`.
    pub async fn get_all_account_balances(&self) -> Result<AllAccountsBalanceResponse, AppError> {
        let accounts: Vec<AccountBalanceResponse> = self
            .store
            .active_account_overviews()
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let total_balance = accounts
            .iter()
            .fold(Decimal::new(0, 2), |sum, account| sum + account.balance);

        tracing::info!(
            total_accounts = accounts.len(),
            %total_balance,
            "Listed account balances"
        );

        Ok(AllAccountsBalanceResponse {
            total_accounts: accounts.len(),
            total_balance,
            accounts,
            timestamp: Utc::now(),
        })
    }
}
