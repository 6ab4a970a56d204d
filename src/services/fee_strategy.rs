//! Card fee strategies.
//!
//! The fee charged for a withdrawal or transfer depends only on the kind of
//! card used: debit cards are free, credit cards pay 1% of the amount,
//! rounded half-up to the cent. All arithmetic is exact decimal.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    error::AppError,
    models::{account::validate_amount, card::CardKind},
};

/// Credit card fee rate (1%).
fn credit_fee_rate() -> Decimal {
    Decimal::new(1, 2)
}

/// Fee strategy, selected by card kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeStrategy {
    /// No fee
    Debit,
    /// 1% of the amount, rounded half-up to 2 decimals
    Credit,
}

impl FeeStrategy {
    pub fn for_card(kind: CardKind) -> Self {
        match kind {
            CardKind::Debit => FeeStrategy::Debit,
            CardKind::Credit => FeeStrategy::Credit,
        }
    }

    /// Strategy name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            FeeStrategy::Debit => "DEBIT_CARD",
            FeeStrategy::Credit => "CREDIT_CARD",
        }
    }

    /// Fee charged on top of `amount`.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is below 0.01 or has sub-cent precision
    pub fn calculate_fee(&self, amount: Decimal) -> Result<Decimal, AppError> {
        validate_amount(amount)?;

        Ok(match self {
            // Scale 2 so the fee renders as 0.00
            FeeStrategy::Debit => Decimal::new(0, 2),
            FeeStrategy::Credit => {
                (amount * credit_fee_rate())
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            }
        })
    }

    /// `amount + fee`, the total debited from the paying account.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is below 0.01 or has sub-cent precision
    pub fn calculate_total_amount(&self, amount: Decimal) -> Result<Decimal, AppError> {
        Ok(amount + self.calculate_fee(amount)?)
    }
}
