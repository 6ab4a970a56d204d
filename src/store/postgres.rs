//! PostgreSQL-backed store.
//!
//! # Locking
//!
//! Every unit of work is one database transaction. `SET LOCAL lock_timeout`
//! bounds how long `SELECT ... FOR UPDATE` waits for another transaction's
//! row lock; PostgreSQL reports the expiry as SQLSTATE `55P03`, which is
//! surfaced as [`AppError::LockTimeout`].
//!
//! # Atomicity
//!
//! Nothing is visible to other connections until [`PgUnitOfWork::commit`].
//! Dropping a `sqlx::Transaction` without committing rolls it back.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction as DbTransaction};

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        account::{Account, AccountOverview},
        card::Card,
        transaction::{NewTransaction, Transaction},
    },
    store::{Store, UnitOfWork},
};

/// SQLSTATE for `lock_not_available`.
const LOCK_NOT_AVAILABLE: &str = "55P03";

const ACCOUNT_COLUMNS: &str =
    "account_id, account_number, user_id, balance, active, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "transaction_id, account_id, to_account_id, transaction_type, \
     amount, fee, total_amount, card_kind, balance_before, balance_after, description, status, \
     created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
    lock_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: DbPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

#[async_trait]
impl Store for PgStore {
    type UnitOfWork = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, AppError> {
        let mut tx = self.pool.begin().await?;

        // `true` scopes the setting to this transaction only
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await?;

        Ok(PgUnitOfWork { tx })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn active_account_overviews(&self) -> Result<Vec<AccountOverview>, AppError> {
        let overviews = sqlx::query_as::<_, AccountOverview>(
            r#"
            SELECT a.account_id, a.account_number, u.first_name, u.last_name, u.email,
                   a.balance, a.active, c.card_kind, c.card_number
            FROM accounts a
            JOIN users u ON u.id = a.user_id
            LEFT JOIN cards c ON c.account_id = a.account_id
            WHERE a.active = TRUE
            ORDER BY a.account_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(overviews)
    }

    async fn find_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn transactions_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<Transaction>, AppError> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE account_id = $1 ORDER BY created_at DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn transactions_for_account_between(
        &self,
        account_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AppError> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE account_id = $1 AND created_at BETWEEN $2 AND $3 \
             ORDER BY created_at DESC"
        ))
        .bind(account_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}

/// One database transaction.
pub struct PgUnitOfWork {
    tx: DbTransaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn load_for_update(&mut self, account_id: &str) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1 FOR UPDATE"
        ))
        .bind(account_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| lock_error(e, account_id))?
        .ok_or_else(|| AppError::AccountNotFound {
            account_id: account_id.to_string(),
        })
    }

    async fn find_card_by_number(&mut self, card_number: &str) -> Result<Option<Card>, AppError> {
        let card = sqlx::query_as::<_, Card>(
            r#"
            SELECT card_number, card_kind, account_id, expiry_date, active
            FROM cards
            WHERE card_number = $1
            "#,
        )
        .bind(card_number)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(card)
    }

    async fn persist(&mut self, account: &mut Account) -> Result<(), AppError> {
        let updated_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance = $1,
                updated_at = NOW()
            WHERE account_id = $2
            RETURNING updated_at
            "#,
        )
        .bind(account.balance)
        .bind(&account.account_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::AccountNotFound {
            account_id: account.account_id.clone(),
        })?;

        account.updated_at = updated_at;
        Ok(())
    }

    async fn transaction_exists(&mut self, transaction_id: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE transaction_id = $1)",
        )
        .bind(transaction_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn append(&mut self, transaction: NewTransaction) -> Result<Transaction, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (
                transaction_id,
                account_id,
                to_account_id,
                transaction_type,
                amount,
                fee,
                total_amount,
                card_kind,
                balance_before,
                balance_after,
                description,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(transaction.transaction_id)
        .bind(transaction.account_id)
        .bind(transaction.to_account_id)
        .bind(transaction.transaction_type)
        .bind(transaction.amount)
        .bind(transaction.fee)
        .bind(transaction.total_amount)
        .bind(transaction.card_kind)
        .bind(transaction.balance_before)
        .bind(transaction.balance_after)
        .bind(transaction.description)
        .bind(transaction.status)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(transaction)
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Map a lock-wait expiry to `LockTimeout`, anything else to `Database`.
fn lock_error(error: sqlx::Error, account_id: &str) -> AppError {
    let lock_expired = error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == LOCK_NOT_AVAILABLE);

    if lock_expired {
        AppError::LockTimeout {
            account_id: account_id.to_string(),
        }
    } else {
        AppError::Database(error)
    }
}
