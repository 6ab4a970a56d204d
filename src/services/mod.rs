//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They open units of work on the store, validate cards, apply fees and
//! record ledger entries.

pub mod account_service;
pub mod card_validator;
pub mod fee_strategy;
pub mod transaction_service;
