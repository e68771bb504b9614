pub mod connection_request;
pub mod ledger_movement;
pub mod missed_interaction;
pub mod wallet;
pub mod withdrawal_request;

use careline_sdk::objects::{
    ApprovalState as SdkApprovalState, MovementPurpose as SdkMovementPurpose,
    MovementStatus as SdkMovementStatus, PaymentDetail, RequestState as SdkRequestState,
    SessionKind as SdkSessionKind, WalletOwnerKind as SdkWalletOwnerKind,
    WithdrawalState as SdkWithdrawalState,
};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Current UTC time as the `TIMESTAMP` type the schema stores.
pub fn now_primitive() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Unix seconds for a stored UTC timestamp.
pub fn unix_seconds(ts: PrimitiveDateTime) -> i64 {
    ts.assume_utc().unix_timestamp()
}

/// Session kind for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `careline_sdk::objects::SessionKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "session_kind")]
pub enum SessionKind {
    Voice,
    Video,
    Chat,
}

impl From<SessionKind> for SdkSessionKind {
    fn from(value: SessionKind) -> Self {
        match value {
            SessionKind::Voice => SdkSessionKind::Voice,
            SessionKind::Video => SdkSessionKind::Video,
            SessionKind::Chat => SdkSessionKind::Chat,
        }
    }
}

impl From<SdkSessionKind> for SessionKind {
    fn from(value: SdkSessionKind) -> Self {
        match value {
            SdkSessionKind::Voice => SessionKind::Voice,
            SdkSessionKind::Video => SessionKind::Video,
            SdkSessionKind::Chat => SessionKind::Chat,
        }
    }
}

/// Connection request state for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `careline_sdk::objects::RequestState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "request_state")]
pub enum RequestState {
    Pending,
    Accepted,
    Rejected,
    Missed,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestState::Pending)
    }
}

impl From<RequestState> for SdkRequestState {
    fn from(value: RequestState) -> Self {
        match value {
            RequestState::Pending => SdkRequestState::Pending,
            RequestState::Accepted => SdkRequestState::Accepted,
            RequestState::Rejected => SdkRequestState::Rejected,
            RequestState::Missed => SdkRequestState::Missed,
        }
    }
}

impl From<SdkRequestState> for RequestState {
    fn from(value: SdkRequestState) -> Self {
        match value {
            SdkRequestState::Pending => RequestState::Pending,
            SdkRequestState::Accepted => RequestState::Accepted,
            SdkRequestState::Rejected => RequestState::Rejected,
            SdkRequestState::Missed => RequestState::Missed,
        }
    }
}

/// Wallet population for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "wallet_owner_kind")]
pub enum WalletOwnerKind {
    Requester,
    Responder,
    Platform,
}

impl From<WalletOwnerKind> for SdkWalletOwnerKind {
    fn from(value: WalletOwnerKind) -> Self {
        match value {
            WalletOwnerKind::Requester => SdkWalletOwnerKind::Requester,
            WalletOwnerKind::Responder => SdkWalletOwnerKind::Responder,
            WalletOwnerKind::Platform => SdkWalletOwnerKind::Platform,
        }
    }
}

impl From<SdkWalletOwnerKind> for WalletOwnerKind {
    fn from(value: SdkWalletOwnerKind) -> Self {
        match value {
            SdkWalletOwnerKind::Requester => WalletOwnerKind::Requester,
            SdkWalletOwnerKind::Responder => WalletOwnerKind::Responder,
            SdkWalletOwnerKind::Platform => WalletOwnerKind::Platform,
        }
    }
}

/// Ledger movement purpose for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "movement_purpose")]
pub enum MovementPurpose {
    Deposit,
    SessionCharge,
    SessionShare,
    Withdrawal,
    Refund,
    Penalty,
}

impl From<MovementPurpose> for SdkMovementPurpose {
    fn from(value: MovementPurpose) -> Self {
        match value {
            MovementPurpose::Deposit => SdkMovementPurpose::Deposit,
            MovementPurpose::SessionCharge => SdkMovementPurpose::SessionCharge,
            MovementPurpose::SessionShare => SdkMovementPurpose::SessionShare,
            MovementPurpose::Withdrawal => SdkMovementPurpose::Withdrawal,
            MovementPurpose::Refund => SdkMovementPurpose::Refund,
            MovementPurpose::Penalty => SdkMovementPurpose::Penalty,
        }
    }
}

impl From<SdkMovementPurpose> for MovementPurpose {
    fn from(value: SdkMovementPurpose) -> Self {
        match value {
            SdkMovementPurpose::Deposit => MovementPurpose::Deposit,
            SdkMovementPurpose::SessionCharge => MovementPurpose::SessionCharge,
            SdkMovementPurpose::SessionShare => MovementPurpose::SessionShare,
            SdkMovementPurpose::Withdrawal => MovementPurpose::Withdrawal,
            SdkMovementPurpose::Refund => MovementPurpose::Refund,
            SdkMovementPurpose::Penalty => MovementPurpose::Penalty,
        }
    }
}

/// Ledger movement status for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "movement_status")]
pub enum MovementStatus {
    Pending,
    Success,
    Failed,
}

impl From<MovementStatus> for SdkMovementStatus {
    fn from(value: MovementStatus) -> Self {
        match value {
            MovementStatus::Pending => SdkMovementStatus::Pending,
            MovementStatus::Success => SdkMovementStatus::Success,
            MovementStatus::Failed => SdkMovementStatus::Failed,
        }
    }
}

impl From<SdkMovementStatus> for MovementStatus {
    fn from(value: SdkMovementStatus) -> Self {
        match value {
            SdkMovementStatus::Pending => MovementStatus::Pending,
            SdkMovementStatus::Success => MovementStatus::Success,
            SdkMovementStatus::Failed => MovementStatus::Failed,
        }
    }
}

/// Withdrawal lifecycle state for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "withdrawal_state")]
pub enum WithdrawalState {
    Pending,
    Success,
    Failed,
}

impl From<WithdrawalState> for SdkWithdrawalState {
    fn from(value: WithdrawalState) -> Self {
        match value {
            WithdrawalState::Pending => SdkWithdrawalState::Pending,
            WithdrawalState::Success => SdkWithdrawalState::Success,
            WithdrawalState::Failed => SdkWithdrawalState::Failed,
        }
    }
}

impl From<SdkWithdrawalState> for WithdrawalState {
    fn from(value: SdkWithdrawalState) -> Self {
        match value {
            SdkWithdrawalState::Pending => WithdrawalState::Pending,
            SdkWithdrawalState::Success => WithdrawalState::Success,
            SdkWithdrawalState::Failed => WithdrawalState::Failed,
        }
    }
}

/// Admin approval state for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "approval_state")]
pub enum ApprovalState {
    Waiting,
    Approved,
    Rejected,
}

impl From<ApprovalState> for SdkApprovalState {
    fn from(value: ApprovalState) -> Self {
        match value {
            ApprovalState::Waiting => SdkApprovalState::Waiting,
            ApprovalState::Approved => SdkApprovalState::Approved,
            ApprovalState::Rejected => SdkApprovalState::Rejected,
        }
    }
}

impl From<SdkApprovalState> for ApprovalState {
    fn from(value: SdkApprovalState) -> Self {
        match value {
            SdkApprovalState::Waiting => ApprovalState::Waiting,
            SdkApprovalState::Approved => ApprovalState::Approved,
            SdkApprovalState::Rejected => ApprovalState::Rejected,
        }
    }
}

/// Payout rail for database operations. The detail columns (`upi_id`,
/// `account_number`, `ifsc_code`) are flattened in the row; the API carries
/// them as the tagged `PaymentDetail` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "payout_method")]
pub enum PayoutMethod {
    Upi,
    Bank,
}

impl From<&PaymentDetail> for PayoutMethod {
    fn from(value: &PaymentDetail) -> Self {
        match value {
            PaymentDetail::Upi { .. } => PayoutMethod::Upi,
            PaymentDetail::Bank { .. } => PayoutMethod::Bank,
        }
    }
}
