//! Transaction HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - POST /api/v1/transactions/withdraw - Take money out of an account
//! - POST /api/v1/transactions/transfer - Move money between accounts
//! - GET /api/v1/transactions/{id} - Get transaction details

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::AppState,
    models::transaction::{TransactionResponse, TransferRequest, WithdrawRequest},
    store::Store,
};

/// Withdraw from an account with one of its cards.
///
/// # Request Body
///
/// ```json
/// {
///   "account_id": "ACC002",
///   "amount": "100.00",
///   "card_number": "5555555555554444",
///   "description": "ATM withdrawal"
/// }
/// ```
///
/// # Response (200)
///
/// The ledger entry; for a credit card `fee` is 1% of `amount`.
pub async fn withdraw<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    request.validate()?;

    let transaction = state.transactions.withdraw(request).await?;
    Ok(Json(transaction))
}

/// Transfer money between accounts.
///
/// # Atomicity
///
/// Both accounts and the ledger entry are written in a single unit of work.
/// Either all succeed or nothing changes.
///
/// # Validation
///
/// - Source and destination must differ
/// - The card must belong to the source account
/// - Source must cover amount + fee
pub async fn transfer<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    request.validate()?;

    let transaction = state.transactions.transfer(request).await?;
    Ok(Json(transaction))
}

/// Get a ledger entry by id.
pub async fn get_transaction<S: Store>(
    State(state): State<AppState<S>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = state.transactions.get_transaction(&transaction_id).await?;
    Ok(Json(transaction))
}
