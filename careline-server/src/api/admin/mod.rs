//! Admin API handlers.
//!
//! These endpoints are called by the operations dashboard and require the
//! `Careline-Admin-Authorization` header with the plaintext admin secret,
//! verified against the argon2 hash from the config file.
//!
//! # Endpoints
//!
//! - `GET  /withdrawals`                      – list withdrawals awaiting a decision
//! - `POST /withdrawals/{id}/resolve`         – approve or reject a withdrawal
//! - `GET  /wallets/{owner_id}`               – show one wallet
//! - `GET  /wallets/{owner_id}/movements`     – list a wallet's audit trail
//! - `POST /wallets/{owner_id}/penalize`      – deduct the configured penalty
//! - `GET  /responders/{responder_id}/missed` – list missed interactions
//! - `GET  /responders/{responder_id}/requests` – list connection requests

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use careline_core::error::CoreError;

use crate::state::AppState;

mod list_missed;
mod list_movements;
mod list_requests;
mod list_withdrawals;
mod penalize;
mod resolve_withdrawal;
mod show_wallet;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/withdrawals", get(list_withdrawals::list_withdrawals))
        .route(
            "/withdrawals/{withdrawal_id}/resolve",
            post(resolve_withdrawal::resolve_withdrawal),
        )
        .route("/wallets/{owner_id}", get(show_wallet::show_wallet))
        .route(
            "/wallets/{owner_id}/movements",
            get(list_movements::list_movements),
        )
        .route("/wallets/{owner_id}/penalize", post(penalize::penalize))
        .route(
            "/responders/{responder_id}/missed",
            get(list_missed::list_missed),
        )
        .route(
            "/responders/{responder_id}/requests",
            get(list_requests::list_requests),
        )
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    Database(sqlx::Error),
    NotFound,
    AlreadyResolved,
    Core(CoreError),
}

impl From<CoreError> for AdminApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound => Self::NotFound,
            CoreError::AlreadyResolved => Self::AlreadyResolved,
            err => Self::Core(err),
        }
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Database(e) => {
                tracing::error!(error = %e, "Admin API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AdminApiError::NotFound => {
                (StatusCode::NOT_FOUND, "resource not found").into_response()
            }
            AdminApiError::AlreadyResolved => {
                (StatusCode::CONFLICT, "withdrawal already resolved").into_response()
            }
            AdminApiError::Core(e) => {
                tracing::error!(error = %e, "Admin API error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
