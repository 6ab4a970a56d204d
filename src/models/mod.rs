//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request and response bodies built from them.

/// Bank account model
pub mod account;
/// Payment card model
pub mod card;
/// Ledger entry model
pub mod transaction;
/// Account holder model
pub mod user;
