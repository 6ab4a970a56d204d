//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Lookup Errors**: Account or ledger entry does not exist
/// - **Card Errors**: Card unknown, owned by another account, or unusable.
///   These only ever carry the masked card number.
/// - **Business Logic Errors**: Insufficient funds, same-account transfers,
///   amounts that are not whole positive cents
/// - **Concurrency Errors**: Per-account lock not acquired in time
/// - **Validation Errors**: Request body rejected at the boundary
/// - **Infrastructure Errors**: Database or other unexpected failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: String },

    #[error("Card not found: {card}")]
    CardNotFound { card: String },

    #[error("Card {card} does not belong to this account")]
    CardMismatch { card: String },

    #[error("Card {card} is not valid for transactions")]
    CardUnusable { card: String },

    /// Returns HTTP 400 with the balance details attached.
    #[error(
        "Insufficient funds in account {account_id}. Available: €{available_balance:.2}, Requested: €{requested_amount:.2}"
    )]
    InsufficientFunds {
        account_id: String,
        available_balance: Decimal,
        requested_amount: Decimal,
    },

    #[error("{0}")]
    InvalidTransaction(String),

    #[error("{0}")]
    InvalidAmount(String),

    /// Another unit of work held the account lock past the configured wait.
    ///
    /// Returns HTTP 409 Conflict. Not retried by the server.
    #[error("Timed out waiting for lock on account {account_id}")]
    LockTimeout { account_id: String },

    /// Request parameters are invalid.
    ///
    /// The String contains details about what was invalid.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound { transaction_id: String },

    /// Request body failed validation.
    ///
    /// Returns HTTP 400 with per-field messages in `details`.
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            AppError::CardNotFound { .. }
            | AppError::CardMismatch { .. }
            | AppError::CardUnusable { .. } => "INVALID_CARD",
            AppError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            AppError::InvalidTransaction(_) => "INVALID_TRANSACTION",
            AppError::InvalidAmount(_) => "INVALID_AMOUNT",
            AppError::LockTimeout { .. } => "LOCK_TIMEOUT",
            AppError::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AccountNotFound { .. } | AppError::TransactionNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            AppError::CardNotFound { .. }
            | AppError::CardMismatch { .. }
            | AppError::CardUnusable { .. }
            | AppError::InsufficientFunds { .. }
            | AppError::InvalidTransaction(_)
            | AppError::InvalidAmount(_)
            | AppError::InvalidRequest(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LockTimeout { .. } => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured context for the `details` field, if the error has any.
    fn details(&self) -> Option<Value> {
        match self {
            AppError::InsufficientFunds {
                account_id,
                available_balance,
                requested_amount,
            } => Some(json!({
                "account_id": account_id,
                "available_balance": available_balance,
                "requested_amount": requested_amount,
            })),
            AppError::CardNotFound { card }
            | AppError::CardMismatch { card }
            | AppError::CardUnusable { card } => Some(json!({ "card_number": card })),
            AppError::AccountNotFound { account_id } | AppError::LockTimeout { account_id } => {
                Some(json!({ "account_id": account_id }))
            }
            AppError::Validation(errors) => {
                let fields: serde_json::Map<String, Value> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, errs)| {
                        let messages: Vec<String> = errs
                            .iter()
                            .map(|e| {
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            })
                            .collect();
                        (field.to_string(), json!(messages))
                    })
                    .collect();
                Some(Value::Object(fields))
            }
            _ => None,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "INSUFFICIENT_FUNDS",
///     "message": "Insufficient funds in account ACC001. ...",
///     "details": { "account_id": "ACC001", ... }
///   }
/// }
/// ```
///
/// `details` is omitted for errors without structured context. Database and
/// internal errors are logged here and replaced by an opaque message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "An internal error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Unexpected error");
                "An internal error occurred".to_string()
            }
            other => {
                tracing::warn!(code, "{other}");
                other.to_string()
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = self.details() {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
