//! Card validation for money movements.

use chrono::NaiveDate;

use crate::{
    error::AppError,
    models::{
        account::Account,
        card::{Card, mask_card_number},
    },
    store::UnitOfWork,
};

/// Confirm `card_number` belongs to `account` and is usable on `today`.
///
/// # Errors
///
/// - `CardNotFound`: no card has this number
/// - `CardMismatch`: the card is linked to a different account
/// - `CardUnusable`: the card is inactive or expired
///
/// Errors only ever carry the masked card number.
pub async fn validate_card<U: UnitOfWork>(
    uow: &mut U,
    card_number: &str,
    account: &Account,
    today: NaiveDate,
) -> Result<Card, AppError> {
    let card = uow
        .find_card_by_number(card_number)
        .await?
        .ok_or_else(|| AppError::CardNotFound {
            card: mask_card_number(card_number),
        })?;

    if card.account_id != account.account_id {
        return Err(AppError::CardMismatch {
            card: card.masked_number(),
        });
    }

    if !card.is_usable_on(today) {
        return Err(AppError::CardUnusable {
            card: card.masked_number(),
        });
    }

    tracing::debug!(
        card = %card.masked_number(),
        brand = card.brand(),
        kind = ?card.card_kind,
        "Card validated"
    );

    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::tests::account;
    use crate::models::card::{CardKind, tests::card};
    use crate::store::{Store, memory::MemoryStore};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use std::time::Duration as StdDuration;

    fn store_with(cards: Vec<Card>) -> MemoryStore {
        MemoryStore::new(
            StdDuration::from_millis(100),
            Vec::new(),
            vec![account("ACC001", dec!(100.00)), account("ACC002", dec!(100.00))],
            cards,
        )
    }

    #[tokio::test]
    async fn accepts_own_active_card() {
        let store = store_with(vec![card("4111111111111111", CardKind::Debit, "ACC001")]);
        let mut uow = store.begin().await.unwrap();
        let today = Utc::now().date_naive();

        let card = validate_card(&mut uow, "4111111111111111", &account("ACC001", dec!(1)), today)
            .await
            .unwrap();
        assert_eq!(card.card_kind, CardKind::Debit);
    }

    #[tokio::test]
    async fn unknown_card_is_reported_masked() {
        let store = store_with(Vec::new());
        let mut uow = store.begin().await.unwrap();

        let err = validate_card(
            &mut uow,
            "4999999999990001",
            &account("ACC001", dec!(1)),
            Utc::now().date_naive(),
        )
        .await
        .unwrap_err();

        match err {
            AppError::CardNotFound { card } => assert_eq!(card, "**** **** **** 0001"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_card_of_another_account_is_a_mismatch() {
        let store = store_with(vec![card("5555555555554444", CardKind::Credit, "ACC002")]);
        let mut uow = store.begin().await.unwrap();

        let err = validate_card(
            &mut uow,
            "5555555555554444",
            &account("ACC001", dec!(1)),
            Utc::now().date_naive(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::CardMismatch { .. }));
    }

    #[tokio::test]
    async fn expired_or_inactive_cards_are_unusable() {
        let today = Utc::now().date_naive();
        let mut expired = card("4111111111111111", CardKind::Debit, "ACC001");
        expired.expiry_date = today - Duration::days(1);
        let mut inactive = card("4000056655665556", CardKind::Debit, "ACC002");
        inactive.active = false;

        let store = store_with(vec![expired, inactive]);
        let mut uow = store.begin().await.unwrap();

        let err = validate_card(&mut uow, "4111111111111111", &account("ACC001", dec!(1)), today)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CardUnusable { .. }));

        let err = validate_card(&mut uow, "4000056655665556", &account("ACC002", dec!(1)), today)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CardUnusable { .. }));
    }
}
