//! Service API handlers.
//!
//! These endpoints are called by the application backend. POST bodies are
//! signed and verified via the `Careline-Signature` header; GETs carry a
//! signed URL instead.
//!
//! # Endpoints
//!
//! - `POST /requests`              – create a connection request
//! - `POST /requests/{id}/respond` – accept or reject a pending request
//! - `GET  /requests/{id}`         – read the current request snapshot
//! - `POST /sessions/charge`       – bill a completed session
//! - `POST /wallets/deposit`       – record an external top-up
//! - `POST /withdrawals`           – place a withdrawal hold

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use careline_core::error::CoreError;
use careline_core::ledger::DepositOutcome;
use careline_sdk::objects::{
    ChargeResponse, ChargeSession, CreateRequest, CreateWithdrawal, DepositFunds, RespondToRequest,
    WalletOwnerKind, WalletResponse,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::extractors::{SignedBody, VerifiedUrl};
use crate::state::AppState;

/// Build the Service API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/{request_id}/respond", post(respond_to_request))
        .route("/requests/{request_id}", get(get_request))
        .route("/sessions/charge", post(charge_session))
        .route("/wallets/deposit", post(deposit))
        .route("/withdrawals", post(create_withdrawal))
}

/// `POST /requests` — create a new pending connection request.
///
/// Refused when the responder is offline or busy, or when the pair
/// already has a pending request.
async fn create_request(
    state: axum::extract::State<AppState>,
    SignedBody(payload): SignedBody<CreateRequest>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let request = state
        .coordinator
        .request(payload.requester_id, payload.responder_id, payload.kind.into())
        .await?;
    Ok((StatusCode::CREATED, Json(request.to_response())))
}

/// `POST /requests/{id}/respond` — accept or reject a pending request.
///
/// Exactly one of respond/expiry wins; a second caller gets `409`.
async fn respond_to_request(
    state: axum::extract::State<AppState>,
    Path(request_id): Path<Uuid>,
    SignedBody(payload): SignedBody<RespondToRequest>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let request = state.coordinator.respond(request_id, payload.accept).await?;
    Ok(Json(request.to_response()))
}

/// `GET /requests/{id}` — read the current snapshot of a request.
async fn get_request(
    state: axum::extract::State<AppState>,
    _verified: VerifiedUrl,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let request = state.coordinator.get(request_id).await?;
    Ok(Json(request.to_response()))
}

/// `POST /sessions/charge` — bill a completed session.
///
/// The requester pays the full amount; the responder is credited their
/// configured share and the platform wallet absorbs the remainder.
async fn charge_session(
    state: axum::extract::State<AppState>,
    SignedBody(payload): SignedBody<ChargeSession>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let outcome = state
        .settlement
        .charge_session(
            payload.requester_id,
            payload.responder_id,
            payload.amount,
            payload.kind.into(),
            payload.duration_secs,
        )
        .await?;
    Ok(Json(ChargeResponse {
        requester_balance: outcome.payer.balance,
        responder_balance: outcome.payee.balance,
        responder_share: outcome.responder_share,
    }))
}

/// `POST /wallets/deposit` — record an external payment attempt.
///
/// A successful payment credits the requester wallet; a failed one only
/// leaves the audit row and the balance is reported unchanged.
async fn deposit(
    state: axum::extract::State<AppState>,
    SignedBody(payload): SignedBody<DepositFunds>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let outcome = state
        .settlement
        .deposit(
            payload.requester_id,
            payload.amount,
            &payload.reference,
            payload.succeeded,
        )
        .await?;
    let wallet = match outcome {
        DepositOutcome::Credited(wallet) => wallet.to_response(),
        // A failed first deposit leaves no wallet row behind.
        DepositOutcome::Rejected => match state.settlement.wallet(payload.requester_id).await {
            Ok(wallet) => wallet.to_response(),
            Err(CoreError::NotFound) => WalletResponse {
                owner_id: payload.requester_id,
                owner_kind: WalletOwnerKind::Requester,
                balance: Decimal::ZERO,
            },
            Err(err) => return Err(err.into()),
        },
    };
    Ok(Json(wallet))
}

/// `POST /withdrawals` — place a pessimistic withdrawal hold.
///
/// The amount leaves the responder wallet immediately and stays held
/// until an admin resolves the request.
async fn create_withdrawal(
    state: axum::extract::State<AppState>,
    SignedBody(payload): SignedBody<CreateWithdrawal>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let withdrawal = state
        .settlement
        .request_withdrawal(payload.responder_id, payload.amount, &payload.detail)
        .await?;
    Ok((StatusCode::CREATED, Json(withdrawal.to_response())))
}

/// Errors that can occur in Service API handlers.
#[derive(Debug)]
enum ServiceApiError {
    /// The pair already has a pending request.
    Conflict,
    /// The request or withdrawal was already resolved.
    AlreadyResolved,
    /// The responder is offline or busy.
    ResponderUnavailable,
    /// The wallet balance does not cover the amount.
    InsufficientFunds,
    /// Zero or negative amount.
    InvalidAmount,
    /// The referenced resource does not exist.
    NotFound,
    /// A store operation failed.
    Store(CoreError),
}

impl From<CoreError> for ServiceApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Conflict => Self::Conflict,
            CoreError::AlreadyResolved => Self::AlreadyResolved,
            CoreError::ResponderUnavailable => Self::ResponderUnavailable,
            CoreError::InsufficientFunds => Self::InsufficientFunds,
            CoreError::InvalidAmount => Self::InvalidAmount,
            CoreError::NotFound => Self::NotFound,
            err => Self::Store(err),
        }
    }
}

impl IntoResponse for ServiceApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceApiError::Conflict => (
                StatusCode::CONFLICT,
                "a pending request already exists for this pair",
            )
                .into_response(),
            ServiceApiError::AlreadyResolved => {
                (StatusCode::CONFLICT, "already resolved").into_response()
            }
            ServiceApiError::ResponderUnavailable => {
                (StatusCode::CONFLICT, "responder unavailable").into_response()
            }
            ServiceApiError::InsufficientFunds => {
                (StatusCode::PAYMENT_REQUIRED, "insufficient funds").into_response()
            }
            ServiceApiError::InvalidAmount => {
                (StatusCode::BAD_REQUEST, "amount must be positive").into_response()
            }
            ServiceApiError::NotFound => {
                (StatusCode::NOT_FOUND, "resource not found").into_response()
            }
            ServiceApiError::Store(e) => {
                tracing::error!(error = %e, "Service API store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
