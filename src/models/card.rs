//! Payment card model.
//!
//! A card is linked 1:1 to an account and decides which fee strategy a
//! withdrawal or transfer is charged with. The full card number is only read
//! on the validation path; everything that leaves this module for display
//! goes through [`Card::masked_number`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of payment card.
///
/// Maps to the PostgreSQL enum type `card_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "card_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CardKind {
    Debit,
    Credit,
}

/// Represents a card record from the database.
///
/// # Database Table
///
/// Maps to the `cards` table. `card_number` and `account_id` are both unique,
/// which makes the account/card relationship one-to-one.
///
/// Only the columns the validation path reads are loaded; holder name and
/// timestamps stay in the table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Card {
    /// Full card number. Never serialized and never logged.
    pub card_number: String,

    pub card_kind: CardKind,

    /// Owning account
    pub account_id: String,

    /// Last day on which the card may be used
    pub expiry_date: NaiveDate,

    pub active: bool,
}

impl Card {
    /// A card is expired once `today` is strictly after its expiry date.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        today > self.expiry_date
    }

    /// Whether the card may be used for a transaction on `today`.
    pub fn is_usable_on(&self, today: NaiveDate) -> bool {
        self.active && !self.is_expired_on(today)
    }

    /// Display form of the card number, e.g. `**** **** **** 1234`.
    pub fn masked_number(&self) -> String {
        mask_card_number(&self.card_number)
    }

    /// Card brand inferred from the first digit of the number.
    pub fn brand(&self) -> &'static str {
        match self.card_number.chars().next() {
            Some('4') => "Visa",
            Some('5') => "Mastercard",
            Some('3') => "American Express",
            _ => "Unknown",
        }
    }
}

/// Mask a raw card number so only the last four digits remain.
///
/// Numbers shorter than four characters are masked completely.
pub fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().collect();
    if digits.len() < 4 {
        return "****".to_string();
    }
    let last_four: String = digits[digits.len() - 4..].iter().collect();
    format!("**** **** **** {last_four}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    pub(crate) fn card(number: &str, kind: CardKind, account_id: &str) -> Card {
        Card {
            card_number: number.to_string(),
            card_kind: kind,
            account_id: account_id.to_string(),
            expiry_date: Utc::now().date_naive() + chrono::Duration::days(365),
            active: true,
        }
    }

    #[rstest]
    #[case("4111111111111111", "Visa")]
    #[case("5500000000000004", "Mastercard")]
    #[case("340000000000009", "American Express")]
    #[case("6011000000000004", "Unknown")]
    #[case("", "Unknown")]
    fn brand_follows_first_digit(#[case] number: &str, #[case] brand: &str) {
        assert_eq!(card(number, CardKind::Debit, "ACC001").brand(), brand);
    }

    #[test]
    fn masking_keeps_only_last_four_digits() {
        let card = card("4111111111111234", CardKind::Debit, "ACC001");
        assert_eq!(card.masked_number(), "**** **** **** 1234");
        assert_eq!(mask_card_number("123"), "****");
    }

    #[test]
    fn expiry_date_is_the_last_usable_day() {
        let mut card = card("4111111111111234", CardKind::Debit, "ACC001");
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        card.expiry_date = today;
        assert!(card.is_usable_on(today));
        assert!(!card.is_usable_on(today.succ_opt().unwrap()));
    }

    #[test]
    fn inactive_card_is_not_usable() {
        let mut card = card("4111111111111234", CardKind::Credit, "ACC001");
        card.active = false;
        assert!(!card.is_usable_on(Utc::now().date_naive()));
    }
}
