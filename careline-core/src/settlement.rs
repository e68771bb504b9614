//! The settlement engine: policy layer above the ledger.
//!
//! Validates amounts, computes the responder's share from the configured
//! split ratio, and applies the flat penalty. All atomicity lives in the
//! [`LedgerStore`] beneath it.

use std::sync::Arc;

use careline_sdk::objects::PaymentDetail;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::config::{ConfigStore, SettlementConfig};
use crate::entities::SessionKind;
use crate::entities::wallet::Wallet;
use crate::entities::withdrawal_request::WithdrawalRequest;
use crate::error::{CoreError, CoreResult};
use crate::ledger::{ChargeOutcome, DepositOutcome, LedgerStore};

pub struct SettlementEngine {
    ledger: Arc<dyn LedgerStore>,
    config: ConfigStore<SettlementConfig>,
}

impl SettlementEngine {
    pub fn new(ledger: Arc<dyn LedgerStore>, config: ConfigStore<SettlementConfig>) -> Self {
        Self { ledger, config }
    }

    /// The responder's cut of a charge, rounded to the ledger's two
    /// decimal places (banker's rounding). The platform wallet absorbs
    /// the remainder, so the two credits always sum to the debit.
    fn responder_share(amount: Decimal, split_ratio: Decimal) -> Decimal {
        (amount * split_ratio).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    }

    /// Bill a completed session: debit the requester in full, credit the
    /// responder their share and the platform the rest, atomically.
    #[tracing::instrument(skip(self), err)]
    pub async fn charge_session(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        amount: Decimal,
        kind: SessionKind,
        duration_secs: Option<i32>,
    ) -> CoreResult<ChargeOutcome> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount);
        }
        let split_ratio = self.config.read().await.split_ratio;
        let share = Self::responder_share(amount, split_ratio);
        let outcome = self
            .ledger
            .charge(requester_id, responder_id, amount, share, kind, duration_secs)
            .await?;
        tracing::info!(
            %requester_id,
            %responder_id,
            %amount,
            responder_share = %share,
            "session charged"
        );
        Ok(outcome)
    }

    /// Record an external payment attempt against a requester wallet.
    #[tracing::instrument(skip(self), err)]
    pub async fn deposit(
        &self,
        requester_id: Uuid,
        amount: Decimal,
        reference: &str,
        succeeded: bool,
    ) -> CoreResult<DepositOutcome> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount);
        }
        self.ledger
            .deposit(requester_id, amount, reference, succeeded)
            .await
    }

    /// Open a withdrawal: the amount leaves the wallet immediately and
    /// stays held until an admin resolves it.
    #[tracing::instrument(skip(self, detail), err)]
    pub async fn request_withdrawal(
        &self,
        responder_id: Uuid,
        amount: Decimal,
        detail: &PaymentDetail,
    ) -> CoreResult<WithdrawalRequest> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount);
        }
        let withdrawal = self.ledger.place_hold(responder_id, amount, detail).await?;
        tracing::info!(withdrawal_id = withdrawal.id, %responder_id, %amount, "withdrawal hold placed");
        Ok(withdrawal)
    }

    /// Apply the admin decision. Approval finalizes the payout; rejection
    /// refunds the hold. Exactly one decision per withdrawal sticks.
    #[tracing::instrument(skip(self), err)]
    pub async fn resolve_withdrawal(
        &self,
        withdrawal_id: i64,
        approve: bool,
    ) -> CoreResult<WithdrawalRequest> {
        let withdrawal = self.ledger.resolve_hold(withdrawal_id, approve).await?;
        tracing::info!(withdrawal_id, approve, "withdrawal resolved");
        Ok(withdrawal)
    }

    /// Deduct the configured flat penalty, clamped to the wallet balance.
    /// Returns the amount actually deducted.
    #[tracing::instrument(skip(self), err)]
    pub async fn apply_penalty(&self, responder_id: Uuid) -> CoreResult<Decimal> {
        let amount = self.config.read().await.penalty_amount;
        let applied = self.ledger.penalize(responder_id, amount).await?;
        tracing::info!(%responder_id, %applied, "penalty applied");
        Ok(applied)
    }

    pub async fn wallet(&self, owner_id: Uuid) -> CoreResult<Wallet> {
        self.ledger.wallet(owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::WalletOwnerKind;
    use crate::entities::wallet::PLATFORM_OWNER_ID;
    use crate::ledger::MemLedgerStore;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn engine() -> (SettlementEngine, Arc<MemLedgerStore>) {
        let ledger = Arc::new(MemLedgerStore::new());
        let engine = SettlementEngine::new(
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            ConfigStore::new(SettlementConfig::default()),
        );
        (engine, ledger)
    }

    #[tokio::test]
    async fn charge_splits_between_responder_and_platform() {
        let (engine, ledger) = engine();
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());
        ledger
            .open_wallet(requester, WalletOwnerKind::Requester, dec(500))
            .await;

        let outcome = engine
            .charge_session(requester, responder, dec(100), SessionKind::Voice, Some(300))
            .await
            .unwrap();

        assert_eq!(outcome.payer.balance, dec(400));
        assert_eq!(outcome.responder_share, dec(50));
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(50));
        assert_eq!(
            ledger.wallet(PLATFORM_OWNER_ID).await.unwrap().balance,
            dec(50)
        );
    }

    #[tokio::test]
    async fn odd_amounts_round_the_share_and_conserve_the_total() {
        let (engine, ledger) = engine();
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());
        ledger
            .open_wallet(requester, WalletOwnerKind::Requester, Decimal::new(1001, 2))
            .await;

        // 10.01 * 0.5 = 5.005, banker-rounds to 5.00; platform gets 5.01.
        let outcome = engine
            .charge_session(
                requester,
                responder,
                Decimal::new(1001, 2),
                SessionKind::Chat,
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.responder_share, Decimal::new(500, 2));
        assert_eq!(
            ledger.wallet(PLATFORM_OWNER_ID).await.unwrap().balance,
            Decimal::new(501, 2)
        );
        assert_eq!(ledger.total_value().await, Decimal::new(1001, 2));
    }

    #[tokio::test]
    async fn insufficient_funds_charge_moves_nothing() {
        let (engine, ledger) = engine();
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());
        ledger
            .open_wallet(requester, WalletOwnerKind::Requester, dec(10))
            .await;

        let err = engine
            .charge_session(requester, responder, dec(100), SessionKind::Video, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientFunds));
        assert_eq!(ledger.wallet(requester).await.unwrap().balance, dec(10));
        assert!(matches!(
            ledger.wallet(responder).await,
            Err(CoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected_up_front() {
        let (engine, _ledger) = engine();
        let err = engine
            .charge_session(Uuid::new_v4(), Uuid::new_v4(), dec(0), SessionKind::Voice, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount));

        let err = engine
            .deposit(Uuid::new_v4(), dec(-5), "ord", true)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount));
    }

    #[tokio::test]
    async fn withdrawal_flow_holds_then_refunds_on_rejection() {
        let (engine, ledger) = engine();
        let responder = Uuid::new_v4();
        ledger
            .open_wallet(responder, WalletOwnerKind::Responder, dec(200))
            .await;

        let detail = PaymentDetail::Upi {
            upi_id: "responder@upi".into(),
        };
        let withdrawal = engine
            .request_withdrawal(responder, dec(150), &detail)
            .await
            .unwrap();
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(50));

        engine
            .resolve_withdrawal(withdrawal.id, false)
            .await
            .unwrap();
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(200));

        // The decision is final.
        let err = engine
            .resolve_withdrawal(withdrawal.id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyResolved));
    }

    #[tokio::test]
    async fn penalty_uses_configured_amount_and_clamps() {
        let (engine, ledger) = engine();
        let responder = Uuid::new_v4();
        ledger
            .open_wallet(responder, WalletOwnerKind::Responder, dec(30))
            .await;

        let applied = engine.apply_penalty(responder).await.unwrap();
        assert_eq!(applied, dec(30));
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(0));
    }
}
