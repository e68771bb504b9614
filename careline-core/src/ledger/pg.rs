use async_trait::async_trait;
use careline_sdk::objects::PaymentDetail;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::ledger_movement::{LedgerMovement, NewMovement};
use crate::entities::wallet::{PLATFORM_OWNER_ID, Wallet};
use crate::entities::withdrawal_request::WithdrawalRequest;
use crate::entities::{
    ApprovalState, MovementPurpose, MovementStatus, SessionKind, WalletOwnerKind, WithdrawalState,
};
use crate::error::{CoreError, CoreResult};
use crate::ledger::{ChargeOutcome, DepositOutcome, LedgerStore};

/// Postgres-backed ledger.
///
/// Each operation is one transaction; the `CHECK (balance >= 0)` constraint
/// and conditional debits make overdrafts impossible even under concurrent
/// load. Failure audit rows are appended after rollback, outside the
/// transaction, so they survive the failure they describe.
pub struct PgLedgerStore {
    pool: sqlx::PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn charge_inner(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        amount: Decimal,
        responder_share: Decimal,
        kind: SessionKind,
        duration_secs: Option<i32>,
    ) -> CoreResult<ChargeOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(payer) = Wallet::try_debit_tx(&mut tx, requester_id, amount).await? else {
            let exists = Wallet::fetch(&self.pool, requester_id).await?.is_some();
            tx.rollback().await?;
            return Err(if exists {
                CoreError::InsufficientFunds
            } else {
                CoreError::NotFound
            });
        };

        let payee =
            Wallet::credit_tx(&mut tx, responder_id, WalletOwnerKind::Responder, responder_share)
                .await?;
        let platform_cut = amount - responder_share;
        Wallet::credit_tx(&mut tx, PLATFORM_OWNER_ID, WalletOwnerKind::Platform, platform_cut)
            .await?;

        NewMovement::new(MovementPurpose::SessionCharge, MovementStatus::Success, amount)
            .from_owner(requester_id)
            .to_owner(PLATFORM_OWNER_ID)
            .session(kind, duration_secs)
            .insert_tx(&mut tx)
            .await?;
        NewMovement::new(MovementPurpose::SessionShare, MovementStatus::Success, responder_share)
            .from_owner(PLATFORM_OWNER_ID)
            .to_owner(responder_id)
            .session(kind, duration_secs)
            .insert_tx(&mut tx)
            .await?;

        tx.commit().await?;
        Ok(ChargeOutcome {
            payer,
            payee,
            responder_share,
        })
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn charge(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        amount: Decimal,
        responder_share: Decimal,
        kind: SessionKind,
        duration_secs: Option<i32>,
    ) -> CoreResult<ChargeOutcome> {
        let outcome = self
            .charge_inner(
                requester_id,
                responder_id,
                amount,
                responder_share,
                kind,
                duration_secs,
            )
            .await;
        if let Err(err) = &outcome {
            // Best-effort audit row for the failed attempt. The charge
            // already failed; a second failure here is only logged.
            let audit =
                NewMovement::new(MovementPurpose::SessionCharge, MovementStatus::Failed, amount)
                    .from_owner(requester_id)
                    .to_owner(responder_id)
                    .session(kind, duration_secs)
                    .insert(&self.pool)
                    .await;
            if let Err(audit_err) = audit {
                tracing::warn!(
                    error = %audit_err,
                    cause = %err,
                    "failed to record failed-charge movement"
                );
            }
        }
        outcome
    }

    async fn deposit(
        &self,
        requester_id: Uuid,
        amount: Decimal,
        reference: &str,
        succeeded: bool,
    ) -> CoreResult<DepositOutcome> {
        if !succeeded {
            NewMovement::new(MovementPurpose::Deposit, MovementStatus::Failed, amount)
                .to_owner(requester_id)
                .reference(reference)
                .insert(&self.pool)
                .await?;
            return Ok(DepositOutcome::Rejected);
        }

        let mut tx = self.pool.begin().await?;
        let wallet =
            Wallet::credit_tx(&mut tx, requester_id, WalletOwnerKind::Requester, amount).await?;
        NewMovement::new(MovementPurpose::Deposit, MovementStatus::Success, amount)
            .to_owner(requester_id)
            .reference(reference)
            .insert_tx(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(DepositOutcome::Credited(wallet))
    }

    async fn place_hold(
        &self,
        responder_id: Uuid,
        amount: Decimal,
        detail: &PaymentDetail,
    ) -> CoreResult<WithdrawalRequest> {
        let mut tx = self.pool.begin().await?;

        let debited = Wallet::try_debit_tx(&mut tx, responder_id, amount).await?;
        if debited.is_none() {
            let exists = Wallet::fetch(&self.pool, responder_id).await?.is_some();
            tx.rollback().await?;
            return Err(if exists {
                CoreError::InsufficientFunds
            } else {
                CoreError::NotFound
            });
        }

        let withdrawal = WithdrawalRequest::insert_tx(&mut tx, responder_id, amount, detail).await?;
        NewMovement::new(MovementPurpose::Withdrawal, MovementStatus::Pending, amount)
            .from_owner(responder_id)
            .withdrawal(withdrawal.id)
            .insert_tx(&mut tx)
            .await?;

        tx.commit().await?;
        Ok(withdrawal)
    }

    async fn resolve_hold(
        &self,
        withdrawal_id: i64,
        approve: bool,
    ) -> CoreResult<WithdrawalRequest> {
        let (state, approval) = if approve {
            (WithdrawalState::Success, ApprovalState::Approved)
        } else {
            (WithdrawalState::Failed, ApprovalState::Rejected)
        };

        let mut tx = self.pool.begin().await?;
        let Some(withdrawal) =
            WithdrawalRequest::resolve_if_pending_tx(&mut tx, withdrawal_id, state, approval)
                .await?
        else {
            tx.rollback().await?;
            return match WithdrawalRequest::get(&self.pool, withdrawal_id).await? {
                Some(_) => Err(CoreError::AlreadyResolved),
                None => Err(CoreError::NotFound),
            };
        };

        let final_status = if approve {
            MovementStatus::Success
        } else {
            MovementStatus::Failed
        };
        LedgerMovement::mark_withdrawal_resolved_tx(&mut tx, withdrawal_id, final_status).await?;

        if !approve {
            // Compensating refund of the pessimistic hold.
            Wallet::credit_tx(
                &mut tx,
                withdrawal.responder_id,
                WalletOwnerKind::Responder,
                withdrawal.amount,
            )
            .await?;
            NewMovement::new(MovementPurpose::Refund, MovementStatus::Success, withdrawal.amount)
                .to_owner(withdrawal.responder_id)
                .withdrawal(withdrawal_id)
                .insert_tx(&mut tx)
                .await?;
        }

        tx.commit().await?;
        Ok(withdrawal)
    }

    async fn penalize(&self, responder_id: Uuid, amount: Decimal) -> CoreResult<Decimal> {
        let mut tx = self.pool.begin().await?;
        let wallet = Wallet::fetch_for_update_tx(&mut tx, responder_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        let applied = wallet.balance.min(amount);
        if applied <= Decimal::ZERO {
            tx.rollback().await?;
            return Ok(Decimal::ZERO);
        }

        // The row is locked, so the conditional debit cannot miss.
        Wallet::try_debit_tx(&mut tx, responder_id, applied).await?;
        Wallet::credit_tx(&mut tx, PLATFORM_OWNER_ID, WalletOwnerKind::Platform, applied).await?;
        NewMovement::new(MovementPurpose::Penalty, MovementStatus::Success, applied)
            .from_owner(responder_id)
            .to_owner(PLATFORM_OWNER_ID)
            .insert_tx(&mut tx)
            .await?;

        tx.commit().await?;
        Ok(applied)
    }

    async fn wallet(&self, owner_id: Uuid) -> CoreResult<Wallet> {
        Wallet::fetch(&self.pool, owner_id)
            .await?
            .ok_or(CoreError::NotFound)
    }
}
