//! Account data models and API response types.
//!
//! This module defines:
//! - `Account`: Database entity representing a bank account
//! - `AccountOverview`: Account joined with its holder and card, for listings
//! - `AccountBalanceResponse` / `AllAccountsBalanceResponse`: Response bodies

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::AppError;
use crate::models::card::{CardKind, mask_card_number};

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. Each account:
/// - Is owned by one user (via `user_id`)
/// - Has at most one card (the `cards` table references the account)
/// - Has a balance stored as `NUMERIC(19, 2)`
///
/// # Balance
///
/// The balance is an exact decimal and never negative. It is only changed
/// through [`Account::withdraw`] and [`Account::deposit`], which both reject
/// amounts that are not a positive whole number of cents.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Stable account identifier, e.g. `ACC001`
    pub account_id: String,

    /// Account number (IBAN), unique and immutable
    pub account_number: String,

    /// Owning user
    pub user_id: i64,

    /// Current balance
    pub balance: Decimal,

    /// Inactive accounts are hidden from balance listings
    pub active: bool,

    pub created_at: DateTime<Utc>,

    /// Bumped every time the account is persisted
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Remove `amount` from the balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is below 0.01 or has sub-cent precision
    /// - `InsufficientFunds`: balance is lower than amount
    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), AppError> {
        validate_amount(amount)?;

        if !self.has_sufficient_funds(amount) {
            return Err(AppError::InsufficientFunds {
                account_id: self.account_id.clone(),
                available_balance: self.balance,
                requested_amount: amount,
            });
        }

        self.balance -= amount;
        Ok(())
    }

    /// Add `amount` to the balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is below 0.01 or has sub-cent precision
    pub fn deposit(&mut self, amount: Decimal) -> Result<(), AppError> {
        validate_amount(amount)?;
        self.balance += amount;
        Ok(())
    }

    pub fn has_sufficient_funds(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    /// Balance rendered for humans, e.g. `€1,234.50`.
    pub fn formatted_balance(&self) -> String {
        format_euros(self.balance)
    }
}

/// Smallest amount that can be moved: one cent.
pub fn minimum_amount() -> Decimal {
    Decimal::new(1, 2)
}

/// Whether `amount` is a whole number of cents, at least one cent.
///
/// Trailing zeros are ignored, so `10.000` is accepted and `10.005` is not.
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount >= minimum_amount() && amount.normalize().scale() <= 2
}

/// Reject amounts that are not a positive whole number of cents.
///
/// # Errors
///
/// - `InvalidAmount`: below 0.01 or more than two decimal places
pub fn validate_amount(amount: Decimal) -> Result<(), AppError> {
    if !is_valid_amount(amount) {
        return Err(AppError::InvalidAmount(format!(
            "Amount must be at least 0.01 with at most two decimal places. Provided: {amount}"
        )));
    }
    Ok(())
}

/// Format a decimal as euros with thousands separators and two decimals.
fn format_euros(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}€{grouped}.{fraction}")
}

/// An account joined with its owner and (optional) card.
///
/// Produced by the read-only balance listing; no lock is taken.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountOverview {
    pub account_id: String,
    pub account_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub balance: Decimal,
    pub active: bool,
    pub card_kind: Option<CardKind>,
    pub card_number: Option<String>,
}

/// Balance information for one account.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_id": "ACC001",
///   "account_number": "NL91RABO0417164300",
///   "user_name": "John Doe",
///   "user_email": "john.doe@example.com",
///   "balance": "1000.00",
///   "card_kind": "DEBIT",
///   "card_number": "**** **** **** 1234",
///   "active": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalanceResponse {
    pub account_id: String,
    pub account_number: String,
    pub user_name: String,
    pub user_email: String,
    pub balance: Decimal,
    pub card_kind: Option<CardKind>,

    /// Masked card number, or `No card`
    pub card_number: String,

    pub active: bool,
}

impl From<AccountOverview> for AccountBalanceResponse {
    fn from(overview: AccountOverview) -> Self {
        Self {
            account_id: overview.account_id,
            account_number: overview.account_number,
            user_name: format!("{} {}", overview.first_name, overview.last_name),
            user_email: overview.email,
            balance: overview.balance,
            card_kind: overview.card_kind,
            card_number: overview
                .card_number
                .as_deref()
                .map(mask_card_number)
                .unwrap_or_else(|| "No card".to_string()),
            active: overview.active,
        }
    }
}

/// Aggregate balance listing over all active accounts.
#[derive(Debug, Clone, Serialize)]
pub struct AllAccountsBalanceResponse {
    pub accounts: Vec<AccountBalanceResponse>,
    pub total_accounts: usize,
    pub total_balance: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn account(account_id: &str, balance: Decimal) -> Account {
        let now = Utc::now();
        Account {
            account_id: account_id.to_string(),
            account_number: format!("NL00TEST{account_id}"),
            user_id: 1,
            balance,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn withdraw_reduces_balance() {
        let mut account = account("ACC001", dec!(1000.00));
        account.withdraw(dec!(101.00)).unwrap();
        assert_eq!(account.balance, dec!(899.00));
    }

    #[test]
    fn withdraw_more_than_balance_is_rejected_untouched() {
        let mut account = account("ACC001", dec!(50.00));
        let err = account.withdraw(dec!(50.01)).unwrap_err();
        match err {
            AppError::InsufficientFunds {
                account_id,
                available_balance,
                requested_amount,
            } => {
                assert_eq!(account_id, "ACC001");
                assert_eq!(available_balance, dec!(50.00));
                assert_eq!(requested_amount, dec!(50.01));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(account.balance, dec!(50.00));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let mut account = account("ACC001", dec!(50.00));
        assert!(matches!(
            account.deposit(Decimal::ZERO),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(matches!(
            account.withdraw(dec!(-1)),
            Err(AppError::InvalidAmount(_))
        ));
        assert_eq!(account.balance, dec!(50.00));
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        let mut account = account("ACC001", dec!(1000.00));
        assert!(matches!(
            account.withdraw(dec!(10.005)),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(matches!(
            account.deposit(dec!(0.001)),
            Err(AppError::InvalidAmount(_))
        ));
        assert_eq!(account.balance, dec!(1000.00));

        account.withdraw(dec!(10.000)).unwrap();
        assert_eq!(account.balance, dec!(990.00));
    }

    #[test]
    fn formatted_balance_groups_thousands() {
        assert_eq!(account("A", dec!(1234567.5)).formatted_balance(), "€1,234,567.50");
        assert_eq!(account("A", dec!(999.99)).formatted_balance(), "€999.99");
        assert_eq!(account("A", Decimal::ZERO).formatted_balance(), "€0.00");
    }

    #[test]
    fn overview_without_card_renders_placeholder() {
        let response = AccountBalanceResponse::from(AccountOverview {
            account_id: "ACC009".to_string(),
            account_number: "NL00TEST".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Roe".to_string(),
            email: "jane@example.com".to_string(),
            balance: dec!(10.00),
            active: true,
            card_kind: None,
            card_number: None,
        });
        assert_eq!(response.user_name, "Jane Roe");
        assert_eq!(response.card_number, "No card");
    }
}
