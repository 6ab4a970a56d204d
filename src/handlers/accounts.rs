//! Account HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - GET /api/v1/accounts/balances - Balances of all active accounts
//! - GET /api/v1/accounts/{id}/transactions - Ledger history of one account

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    error::AppError,
    handlers::AppState,
    models::{
        account::AllAccountsBalanceResponse,
        transaction::{HistoryQuery, TransactionResponse},
    },
    store::Store,
};

/// List every active account with its balance.
///
/// # Response (200)
///
/// ```json
/// {
///   "accounts": [
///     {
///       "account_id": "ACC001",
///       "account_number": "NL91RABO0417164300",
///       "user_name": "John Doe",
///       "user_email": "john.doe@example.com",
///       "balance": "1000.00",
///       "card_kind": "DEBIT",
///       "card_number": "**** **** **** 1111",
///       "active": true
///     }
///   ],
///   "total_accounts": 1,
///   "total_balance": "1000.00",
///   "timestamp": "2026-10-19T10:00:00Z"
/// }
/// ```
pub async fn get_all_account_balances<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<AllAccountsBalanceResponse>, AppError> {
    let balances = state.accounts.get_all_account_balances().await?;
    Ok(Json(balances))
}

/// Ledger entries paid from an account, newest first.
///
/// # Query Parameters
///
/// - `from`, `to` (optional, RFC 3339): inclusive time window
pub async fn get_account_transactions<S: Store>(
    State(state): State<AppState<S>>,
    Path(account_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let history = state.transactions.account_history(&account_id, query).await?;
    Ok(Json(history))
}
