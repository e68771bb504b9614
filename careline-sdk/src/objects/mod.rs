//! Shared API object types.
//!
//! These are the wire-format (serde) versions of the domain types. The
//! database-side (`sqlx::Type`) versions live in `careline-core::entities`
//! with `From` conversions in both directions.

pub mod admin;
pub mod ws;

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signature::Signature;

/// The kind of real-time session a connection request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Voice,
    Video,
    Chat,
}

/// Lifecycle state of a connection request.
///
/// `Pending` is the only non-terminal state; the three others are terminal
/// and immutable once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Pending,
    Accepted,
    Rejected,
    Missed,
}

impl RequestState {
    /// Returns `true` for the three terminal states.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestState::Pending)
    }
}

/// Which population a wallet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletOwnerKind {
    Requester,
    Responder,
    Platform,
}

/// Why a ledger movement exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPurpose {
    Deposit,
    SessionCharge,
    SessionShare,
    Withdrawal,
    Refund,
    Penalty,
}

/// Outcome status of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    Pending,
    Success,
    Failed,
}

/// Lifecycle state of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalState {
    Pending,
    Success,
    Failed,
}

/// Admin decision recorded on a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Waiting,
    Approved,
    Rejected,
}

/// Where an approved withdrawal should be paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentDetail {
    Upi {
        upi_id: CompactString,
    },
    Bank {
        account_number: CompactString,
        ifsc_code: CompactString,
    },
}

// ---------------------------------------------------------------------------
// Service API payloads (signed bodies)
// ---------------------------------------------------------------------------

/// `POST /requests` — ask to connect to a specific responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    pub kind: SessionKind,
}

impl Signature for CreateRequest {}

/// `POST /requests/{id}/respond` — accept or reject a pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondToRequest {
    pub accept: bool,
}

impl Signature for RespondToRequest {}

/// `POST /sessions/charge` — bill a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeSession {
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    pub amount: Decimal,
    pub kind: SessionKind,
    /// Session length, when the billing layer knows it.
    pub duration_secs: Option<i32>,
}

impl Signature for ChargeSession {}

/// `POST /wallets/deposit` — credit a requester wallet after an external
/// payment. `succeeded = false` records the failed attempt for audit
/// without touching the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositFunds {
    pub requester_id: Uuid,
    pub amount: Decimal,
    /// External payment reference (order id, gateway signature, ...).
    pub reference: CompactString,
    pub succeeded: bool,
}

impl Signature for DepositFunds {}

/// `POST /withdrawals` — place a pessimistic hold on a responder wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWithdrawal {
    pub responder_id: Uuid,
    pub amount: Decimal,
    pub detail: PaymentDetail,
}

impl Signature for CreateWithdrawal {}

/// `POST /withdrawals/{id}/resolve` — admin approval or rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveWithdrawal {
    pub approve: bool,
}

impl Signature for ResolveWithdrawal {}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Snapshot of a connection request as returned by the API and carried by
/// `resolved` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResponse {
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    pub kind: SessionKind,
    pub state: RequestState,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletResponse {
    pub owner_id: Uuid,
    pub owner_kind: WalletOwnerKind,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementResponse {
    pub id: i64,
    pub source_owner: Option<Uuid>,
    pub dest_owner: Option<Uuid>,
    pub amount: Decimal,
    pub purpose: MovementPurpose,
    pub status: MovementStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub id: i64,
    pub responder_id: Uuid,
    pub amount: Decimal,
    pub state: WithdrawalState,
    pub approval: ApprovalState,
    pub created_at: i64,
}

/// Result of a successful session charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeResponse {
    pub requester_balance: Decimal,
    pub responder_balance: Decimal,
    pub responder_share: Decimal,
}
