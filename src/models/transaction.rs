//! Ledger entry models and API request/response types.
//!
//! This module defines:
//! - `Transaction`: Append-only ledger entry as stored in the database
//! - `NewTransaction`: A ledger entry built by the processor, before the store
//!   assigns its timestamp
//! - Request types for withdraw and transfer operations
//! - `TransactionResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{account::is_valid_amount, card::CardKind};

/// Kind of money movement. Maps to PostgreSQL enum `transaction_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Withdrawal,
    Transfer,
}

/// Maps to PostgreSQL enum `transaction_status`.
///
/// The processor only ever records `Success`; the other states exist in the
/// schema for entries written by other systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
}

/// Represents a ledger entry from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Rows are inserted once and never updated
/// or deleted. Amounts, fee and balances all refer to the source account.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct Transaction {
    /// `TXN-<uuid>`
    pub transaction_id: String,

    /// Source (paying) account
    pub account_id: String,

    /// Destination account, only present for transfers
    pub to_account_id: Option<String>,

    pub transaction_type: TransactionType,

    /// Requested amount
    pub amount: Decimal,

    pub fee: Decimal,

    /// `amount + fee`, what was debited from the source account
    pub total_amount: Decimal,

    pub card_kind: CardKind,

    pub balance_before: Decimal,

    pub balance_after: Decimal,

    pub description: Option<String>,

    pub status: TransactionStatus,

    /// Assigned by the store when the entry is appended
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_successful(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    /// One-line description used in logs.
    pub fn summary(&self) -> String {
        format!(
            "Transaction[id={}, type={:?}, amount=€{:.2}, fee=€{:.2}, status={:?}]",
            self.transaction_id, self.transaction_type, self.amount, self.fee, self.status
        )
    }
}

/// A ledger entry that has not been appended yet.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub account_id: String,
    pub to_account_id: Option<String>,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub fee: Decimal,
    pub total_amount: Decimal,
    pub card_kind: CardKind,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub status: TransactionStatus,
}

impl NewTransaction {
    /// Stamp the entry with its creation time.
    pub fn into_transaction(self, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            transaction_id: self.transaction_id,
            account_id: self.account_id,
            to_account_id: self.to_account_id,
            transaction_type: self.transaction_type,
            amount: self.amount,
            fee: self.fee,
            total_amount: self.total_amount,
            card_kind: self.card_kind,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            description: self.description,
            status: self.status,
            created_at,
        }
    }
}

fn cent_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if !is_valid_amount(*amount) {
        let mut error = ValidationError::new("cent_amount");
        error.message = Some("Amount must be at least 0.01 with at most two decimal places".into());
        return Err(error);
    }
    Ok(())
}

/// Request to withdraw money from an account.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_id": "ACC001",
///   "amount": "100.00",
///   "card_number": "4111111111111234",
///   "description": "ATM withdrawal"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WithdrawRequest {
    #[validate(length(min = 1, message = "Account ID is required"))]
    pub account_id: String,

    #[validate(custom(function = "cent_amount"))]
    pub amount: Decimal,

    #[validate(length(min = 1, message = "Card number is required"))]
    pub card_number: String,

    #[validate(length(max = 255, message = "Description is at most 255 characters"))]
    pub description: Option<String>,
}

/// Request to transfer money between accounts.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_account_id": "ACC001",
///   "to_account_id": "ACC002",
///   "amount": "200.00",
///   "card_number": "4111111111111234",
///   "description": "Rent"
/// }
/// ```
///
/// # Atomicity Guarantee
///
/// Both accounts and the ledger entry are written in one unit of work.
/// The fee, if any, is charged to the source account only.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferRequest {
    #[validate(length(min = 1, message = "Source account ID is required"))]
    pub from_account_id: String,

    #[validate(length(min = 1, message = "Destination account ID is required"))]
    pub to_account_id: String,

    #[validate(custom(function = "cent_amount"))]
    pub amount: Decimal,

    #[validate(length(min = 1, message = "Card number is required"))]
    pub card_number: String,

    #[validate(length(max = 255, message = "Description is at most 255 characters"))]
    pub description: Option<String>,
}

/// Response returned for transaction operations.
///
/// # JSON Example
///
/// ```json
/// {
///   "transaction_id": "TXN-7c2d...",
///   "account_id": "ACC001",
///   "to_account_id": null,
///   "type": "WITHDRAWAL",
///   "amount": "100.00",
///   "fee": "1.00",
///   "total_amount": "101.00",
///   "card_kind": "CREDIT",
///   "balance_before": "1000.00",
///   "balance_after": "899.00",
///   "description": "ATM withdrawal",
///   "status": "SUCCESS",
///   "timestamp": "2026-10-19T10:30:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub account_id: String,
    pub to_account_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub fee: Decimal,
    pub total_amount: Decimal,
    pub card_kind: CardKind,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            transaction_id: transaction.transaction_id,
            account_id: transaction.account_id,
            to_account_id: transaction.to_account_id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            fee: transaction.fee,
            total_amount: transaction.total_amount,
            card_kind: transaction.card_kind,
            balance_before: transaction.balance_before,
            balance_after: transaction.balance_after,
            description: transaction.description,
            status: transaction.status,
            timestamp: transaction.created_at,
        }
    }
}

/// Optional time window for ledger history queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn withdraw_request(amount: Decimal) -> WithdrawRequest {
        WithdrawRequest {
            account_id: "ACC001".to_string(),
            amount,
            card_number: "4111111111111234".to_string(),
            description: None,
        }
    }

    #[test]
    fn withdraw_request_requires_whole_cents() {
        assert!(withdraw_request(dec!(0.01)).validate().is_ok());
        assert!(withdraw_request(dec!(25.50)).validate().is_ok());

        for amount in [Decimal::ZERO, dec!(-5), dec!(0.001), dec!(10.005)] {
            let errors = withdraw_request(amount).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("amount"), "{amount} accepted");
        }
    }

    #[test]
    fn transfer_request_requires_both_accounts() {
        let request = TransferRequest {
            from_account_id: "ACC001".to_string(),
            to_account_id: String::new(),
            amount: dec!(10),
            card_number: "4111111111111234".to_string(),
            description: Some("x".repeat(256)),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("to_account_id"));
        assert!(fields.contains_key("description"));
    }

    #[test]
    fn summary_mentions_id_and_amounts() {
        let transaction = NewTransaction {
            transaction_id: "TXN-1".to_string(),
            account_id: "ACC001".to_string(),
            to_account_id: None,
            transaction_type: TransactionType::Withdrawal,
            amount: dec!(100.00),
            fee: dec!(1.00),
            total_amount: dec!(101.00),
            card_kind: CardKind::Credit,
            balance_before: dec!(1000.00),
            balance_after: dec!(899.00),
            description: None,
            status: TransactionStatus::Success,
        }
        .into_transaction(Utc::now());

        assert!(transaction.is_successful());
        assert_eq!(
            transaction.summary(),
            "Transaction[id=TXN-1, type=Withdrawal, amount=€100.00, fee=€1.00, status=Success]"
        );
    }

    #[test]
    fn response_serializes_type_and_status_in_upper_case() {
        let response = TransactionResponse::from(
            NewTransaction {
                transaction_id: "TXN-2".to_string(),
                account_id: "ACC001".to_string(),
                to_account_id: Some("ACC002".to_string()),
                transaction_type: TransactionType::Transfer,
                amount: dec!(200.00),
                fee: dec!(0),
                total_amount: dec!(200.00),
                card_kind: CardKind::Debit,
                balance_before: dec!(1000.00),
                balance_after: dec!(800.00),
                description: None,
                status: TransactionStatus::Success,
            }
            .into_transaction(Utc::now()),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "TRANSFER");
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["card_kind"], "DEBIT");
        assert_eq!(json["balance_after"], "800.00");
    }
}
