//! The wallet ledger: persistence seam for settlement.
//!
//! Every operation is a single atomic unit against the backing store, and
//! every balance change leaves a `ledger_movements` row behind, including
//! failed attempts. Money is conserved: across wallets, pending holds, and
//! approved payouts, value only ever enters through deposits and the sum
//! never changes otherwise.

pub mod mem;
pub mod pg;

use async_trait::async_trait;
use careline_sdk::objects::PaymentDetail;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::SessionKind;
use crate::entities::wallet::Wallet;
use crate::entities::withdrawal_request::WithdrawalRequest;
use crate::error::CoreResult;

pub use mem::MemLedgerStore;
pub use pg::PgLedgerStore;

/// Result of a successful session charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeOutcome {
    pub payer: Wallet,
    pub payee: Wallet,
    pub responder_share: Decimal,
}

/// Result of recording an external deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositOutcome {
    /// The payment succeeded and the wallet was credited.
    Credited(Wallet),
    /// The payment failed upstream; only the audit row was written.
    Rejected,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Atomically debit the requester, credit the responder their share,
    /// and credit the platform wallet the remainder. Nothing moves unless
    /// everything does; a failed attempt is still recorded in the ledger.
    async fn charge(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        amount: Decimal,
        responder_share: Decimal,
        kind: SessionKind,
        duration_secs: Option<i32>,
    ) -> CoreResult<ChargeOutcome>;

    /// Record an external payment. A successful one credits the requester
    /// wallet (creating it on first deposit); a failed one only leaves the
    /// audit row.
    async fn deposit(
        &self,
        requester_id: Uuid,
        amount: Decimal,
        reference: &str,
        succeeded: bool,
    ) -> CoreResult<DepositOutcome>;

    /// Debit the amount out of the responder wallet and open a pending
    /// withdrawal, in one atomic unit. The hold keeps the money out of
    /// reach of concurrent charges and penalties until resolution.
    async fn place_hold(
        &self,
        responder_id: Uuid,
        amount: Decimal,
        detail: &PaymentDetail,
    ) -> CoreResult<WithdrawalRequest>;

    /// Resolve a pending withdrawal. Approval finalizes the payout;
    /// rejection refunds the held amount back to the wallet in the same
    /// atomic unit.
    async fn resolve_hold(&self, withdrawal_id: i64, approve: bool)
    -> CoreResult<WithdrawalRequest>;

    /// Deduct a penalty from the responder wallet, clamped to the current
    /// balance. Returns the amount actually deducted.
    async fn penalize(&self, responder_id: Uuid, amount: Decimal) -> CoreResult<Decimal>;

    async fn wallet(&self, owner_id: Uuid) -> CoreResult<Wallet>;
}
