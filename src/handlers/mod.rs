//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to a service
//! 3. Returns HTTP response (JSON, status code)
//!
//! Handlers are generic over the [`Store`] so the same router serves the
//! PostgreSQL and the in-memory backend.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    services::{account_service::AccountService, transaction_service::TransactionService},
    store::Store,
};

/// Account listing and history endpoints
pub mod accounts;
/// Liveness endpoint
pub mod health;
/// Withdraw, transfer and ledger lookup endpoints
pub mod transactions;

/// Shared handler state.
pub struct AppState<S: Store> {
    pub store: Arc<S>,
    pub transactions: TransactionService<S>,
    pub accounts: AccountService<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            transactions: TransactionService::new(Arc::clone(&store)),
            accounts: AccountService::new(Arc::clone(&store)),
            store,
        }
    }
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            transactions: self.transactions.clone(),
            accounts: self.accounts.clone(),
        }
    }
}

/// Build the HTTP router with every route, CORS for the browser dashboard,
/// and request tracing.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::health_check::<S>))
        .route(
            "/api/v1/accounts/balances",
            get(accounts::get_all_account_balances::<S>),
        )
        .route(
            "/api/v1/accounts/{id}/transactions",
            get(accounts::get_account_transactions::<S>),
        )
        .route(
            "/api/v1/transactions/withdraw",
            post(transactions::withdraw::<S>),
        )
        .route(
            "/api/v1/transactions/transfer",
            post(transactions::transfer::<S>),
        )
        .route(
            "/api/v1/transactions/{id}",
            get(transactions::get_transaction::<S>),
        )
        .layer(CorsLayer::permissive())
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
