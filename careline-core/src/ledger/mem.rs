use std::collections::HashMap;

use async_trait::async_trait;
use careline_sdk::objects::PaymentDetail;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entities::ledger_movement::{LedgerMovement, NewMovement};
use crate::entities::wallet::{PLATFORM_OWNER_ID, Wallet};
use crate::entities::withdrawal_request::WithdrawalRequest;
use crate::entities::{
    ApprovalState, MovementPurpose, MovementStatus, PayoutMethod, SessionKind, WalletOwnerKind,
    WithdrawalState, now_primitive,
};
use crate::error::{CoreError, CoreResult};
use crate::ledger::{ChargeOutcome, DepositOutcome, LedgerStore};

/// In-memory ledger for tests and embedded use. One mutex per store gives
/// the same serialization the database transactions provide.
pub struct MemLedgerStore {
    inner: Mutex<Inner>,
}

struct Inner {
    wallets: HashMap<Uuid, Wallet>,
    movements: Vec<LedgerMovement>,
    withdrawals: HashMap<i64, WithdrawalRequest>,
    next_movement_id: i64,
    next_withdrawal_id: i64,
}

impl Default for MemLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemLedgerStore {
    pub fn new() -> Self {
        let mut wallets = HashMap::new();
        wallets.insert(
            PLATFORM_OWNER_ID,
            Wallet {
                owner_id: PLATFORM_OWNER_ID,
                owner_kind: WalletOwnerKind::Platform,
                balance: Decimal::ZERO,
                updated_at: now_primitive(),
            },
        );
        Self {
            inner: Mutex::new(Inner {
                wallets,
                movements: Vec::new(),
                withdrawals: HashMap::new(),
                next_movement_id: 0,
                next_withdrawal_id: 0,
            }),
        }
    }

    /// Seed a wallet with a starting balance.
    pub async fn open_wallet(&self, owner_id: Uuid, owner_kind: WalletOwnerKind, balance: Decimal) {
        let mut inner = self.inner.lock().await;
        inner.wallets.insert(
            owner_id,
            Wallet {
                owner_id,
                owner_kind,
                balance,
                updated_at: now_primitive(),
            },
        );
    }

    /// All recorded movements, for assertions.
    pub async fn movements(&self) -> Vec<LedgerMovement> {
        self.inner.lock().await.movements.clone()
    }

    /// Total value in the system: wallet balances, plus amounts held by
    /// pending withdrawals, plus approved payouts. Conserved by every
    /// operation except deposits.
    pub async fn total_value(&self) -> Decimal {
        let inner = self.inner.lock().await;
        let balances: Decimal = inner.wallets.values().map(|w| w.balance).sum();
        let held: Decimal = inner
            .withdrawals
            .values()
            .filter(|w| w.state == WithdrawalState::Pending)
            .map(|w| w.amount)
            .sum();
        let paid_out: Decimal = inner
            .withdrawals
            .values()
            .filter(|w| w.approval == ApprovalState::Approved)
            .map(|w| w.amount)
            .sum();
        balances + held + paid_out
    }
}

impl Inner {
    fn record(&mut self, movement: NewMovement) {
        self.next_movement_id += 1;
        self.movements.push(LedgerMovement {
            id: self.next_movement_id,
            source_owner: movement.source_owner,
            dest_owner: movement.dest_owner,
            amount: movement.amount,
            purpose: movement.purpose,
            status: movement.status,
            kind: movement.kind,
            duration_secs: movement.duration_secs,
            reference: movement.reference,
            withdrawal_id: movement.withdrawal_id,
            created_at: now_primitive(),
        });
    }

    fn try_debit(&mut self, owner_id: Uuid, amount: Decimal) -> CoreResult<Wallet> {
        let wallet = self.wallets.get_mut(&owner_id).ok_or(CoreError::NotFound)?;
        if wallet.balance < amount {
            return Err(CoreError::InsufficientFunds);
        }
        wallet.balance -= amount;
        wallet.updated_at = now_primitive();
        Ok(wallet.clone())
    }

    fn credit(&mut self, owner_id: Uuid, owner_kind: WalletOwnerKind, amount: Decimal) -> Wallet {
        let wallet = self.wallets.entry(owner_id).or_insert_with(|| Wallet {
            owner_id,
            owner_kind,
            balance: Decimal::ZERO,
            updated_at: now_primitive(),
        });
        wallet.balance += amount;
        wallet.updated_at = now_primitive();
        wallet.clone()
    }
}

#[async_trait]
impl LedgerStore for MemLedgerStore {
    async fn charge(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        amount: Decimal,
        responder_share: Decimal,
        kind: SessionKind,
        duration_secs: Option<i32>,
    ) -> CoreResult<ChargeOutcome> {
        let mut inner = self.inner.lock().await;
        let payer = match inner.try_debit(requester_id, amount) {
            Ok(payer) => payer,
            Err(err) => {
                inner.record(
                    NewMovement::new(
                        MovementPurpose::SessionCharge,
                        MovementStatus::Failed,
                        amount,
                    )
                    .from_owner(requester_id)
                    .to_owner(responder_id)
                    .session(kind, duration_secs),
                );
                return Err(err);
            }
        };
        let payee = inner.credit(responder_id, WalletOwnerKind::Responder, responder_share);
        inner.credit(
            PLATFORM_OWNER_ID,
            WalletOwnerKind::Platform,
            amount - responder_share,
        );
        inner.record(
            NewMovement::new(MovementPurpose::SessionCharge, MovementStatus::Success, amount)
                .from_owner(requester_id)
                .to_owner(PLATFORM_OWNER_ID)
                .session(kind, duration_secs),
        );
        inner.record(
            NewMovement::new(
                MovementPurpose::SessionShare,
                MovementStatus::Success,
                responder_share,
            )
            .from_owner(PLATFORM_OWNER_ID)
            .to_owner(responder_id)
            .session(kind, duration_secs),
        );
        Ok(ChargeOutcome {
            payer,
            payee,
            responder_share,
        })
    }

    async fn deposit(
        &self,
        requester_id: Uuid,
        amount: Decimal,
        reference: &str,
        succeeded: bool,
    ) -> CoreResult<DepositOutcome> {
        let mut inner = self.inner.lock().await;
        if !succeeded {
            inner.record(
                NewMovement::new(MovementPurpose::Deposit, MovementStatus::Failed, amount)
                    .to_owner(requester_id)
                    .reference(reference),
            );
            return Ok(DepositOutcome::Rejected);
        }
        let wallet = inner.credit(requester_id, WalletOwnerKind::Requester, amount);
        inner.record(
            NewMovement::new(MovementPurpose::Deposit, MovementStatus::Success, amount)
                .to_owner(requester_id)
                .reference(reference),
        );
        Ok(DepositOutcome::Credited(wallet))
    }

    async fn place_hold(
        &self,
        responder_id: Uuid,
        amount: Decimal,
        detail: &PaymentDetail,
    ) -> CoreResult<WithdrawalRequest> {
        let mut inner = self.inner.lock().await;
        inner.try_debit(responder_id, amount)?;

        inner.next_withdrawal_id += 1;
        let id = inner.next_withdrawal_id;
        let (upi_id, account_number, ifsc_code) = match detail {
            PaymentDetail::Upi { upi_id } => (Some(upi_id.to_string()), None, None),
            PaymentDetail::Bank {
                account_number,
                ifsc_code,
            } => (
                None,
                Some(account_number.to_string()),
                Some(ifsc_code.to_string()),
            ),
        };
        let withdrawal = WithdrawalRequest {
            id,
            responder_id,
            amount,
            method: PayoutMethod::from(detail),
            upi_id,
            account_number,
            ifsc_code,
            state: WithdrawalState::Pending,
            approval: ApprovalState::Waiting,
            created_at: now_primitive(),
            resolved_at: None,
        };
        inner.withdrawals.insert(id, withdrawal.clone());
        inner.record(
            NewMovement::new(MovementPurpose::Withdrawal, MovementStatus::Pending, amount)
                .from_owner(responder_id)
                .withdrawal(id),
        );
        Ok(withdrawal)
    }

    async fn resolve_hold(
        &self,
        withdrawal_id: i64,
        approve: bool,
    ) -> CoreResult<WithdrawalRequest> {
        let mut inner = self.inner.lock().await;
        let withdrawal = inner
            .withdrawals
            .get_mut(&withdrawal_id)
            .ok_or(CoreError::NotFound)?;
        if withdrawal.state != WithdrawalState::Pending {
            return Err(CoreError::AlreadyResolved);
        }
        if approve {
            withdrawal.state = WithdrawalState::Success;
            withdrawal.approval = ApprovalState::Approved;
        } else {
            withdrawal.state = WithdrawalState::Failed;
            withdrawal.approval = ApprovalState::Rejected;
        }
        withdrawal.resolved_at = Some(now_primitive());
        let withdrawal = withdrawal.clone();

        let final_status = if approve {
            MovementStatus::Success
        } else {
            MovementStatus::Failed
        };
        for movement in &mut inner.movements {
            if movement.withdrawal_id == Some(withdrawal_id)
                && movement.purpose == MovementPurpose::Withdrawal
                && movement.status == MovementStatus::Pending
            {
                movement.status = final_status;
            }
        }

        if !approve {
            inner.credit(
                withdrawal.responder_id,
                WalletOwnerKind::Responder,
                withdrawal.amount,
            );
            inner.record(
                NewMovement::new(
                    MovementPurpose::Refund,
                    MovementStatus::Success,
                    withdrawal.amount,
                )
                .to_owner(withdrawal.responder_id)
                .withdrawal(withdrawal_id),
            );
        }

        Ok(withdrawal)
    }

    async fn penalize(&self, responder_id: Uuid, amount: Decimal) -> CoreResult<Decimal> {
        let mut inner = self.inner.lock().await;
        let balance = inner
            .wallets
            .get(&responder_id)
            .ok_or(CoreError::NotFound)?
            .balance;
        let applied = balance.min(amount);
        if applied <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        inner.try_debit(responder_id, applied)?;
        inner.credit(PLATFORM_OWNER_ID, WalletOwnerKind::Platform, applied);
        inner.record(
            NewMovement::new(MovementPurpose::Penalty, MovementStatus::Success, applied)
                .from_owner(responder_id)
                .to_owner(PLATFORM_OWNER_ID),
        );
        Ok(applied)
    }

    async fn wallet(&self, owner_id: Uuid) -> CoreResult<Wallet> {
        self.inner
            .lock()
            .await
            .wallets
            .get(&owner_id)
            .cloned()
            .ok_or(CoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    #[tokio::test]
    async fn failed_charge_leaves_audit_row_and_balances_untouched() {
        let ledger = MemLedgerStore::new();
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());
        ledger
            .open_wallet(requester, WalletOwnerKind::Requester, dec(10))
            .await;

        let err = ledger
            .charge(requester, responder, dec(100), dec(50), SessionKind::Voice, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientFunds));

        assert_eq!(ledger.wallet(requester).await.unwrap().balance, dec(10));
        let movements = ledger.movements().await;
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].status, MovementStatus::Failed);
        assert_eq!(movements[0].purpose, MovementPurpose::SessionCharge);
    }

    #[tokio::test]
    async fn hold_keeps_funds_out_of_reach() {
        let ledger = MemLedgerStore::new();
        let responder = Uuid::new_v4();
        ledger
            .open_wallet(responder, WalletOwnerKind::Responder, dec(100))
            .await;

        let detail = PaymentDetail::Upi {
            upi_id: "responder@upi".into(),
        };
        ledger.place_hold(responder, dec(80), &detail).await.unwrap();

        // The held 80 cannot be withdrawn again.
        let err = ledger
            .place_hold(responder, dec(50), &detail)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientFunds));
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(20));
    }

    #[tokio::test]
    async fn penalty_is_clamped_to_balance() {
        let ledger = MemLedgerStore::new();
        let responder = Uuid::new_v4();
        ledger
            .open_wallet(responder, WalletOwnerKind::Responder, dec(30))
            .await;

        let applied = ledger.penalize(responder, dec(50)).await.unwrap();
        assert_eq!(applied, dec(30));
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(0));

        // A second penalty on an empty wallet applies nothing.
        let applied = ledger.penalize(responder, dec(50)).await.unwrap();
        assert_eq!(applied, dec(0));
    }

    #[tokio::test]
    async fn value_is_conserved_by_every_operation_but_deposit() {
        let ledger = MemLedgerStore::new();
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());

        ledger
            .deposit(requester, dec(500), "ord_1", true)
            .await
            .unwrap();
        assert_eq!(ledger.total_value().await, dec(500));

        ledger
            .charge(requester, responder, dec(100), dec(50), SessionKind::Video, Some(600))
            .await
            .unwrap();
        assert_eq!(ledger.total_value().await, dec(500));

        let detail = PaymentDetail::Bank {
            account_number: "0011223344".into(),
            ifsc_code: "ABCD0001234".into(),
        };
        let hold = ledger.place_hold(responder, dec(40), &detail).await.unwrap();
        assert_eq!(ledger.total_value().await, dec(500));

        ledger.resolve_hold(hold.id, true).await.unwrap();
        assert_eq!(ledger.total_value().await, dec(500));

        ledger.penalize(responder, dec(5)).await.unwrap();
        assert_eq!(ledger.total_value().await, dec(500));
    }

    #[tokio::test]
    async fn rejected_hold_refunds_the_wallet() {
        let ledger = MemLedgerStore::new();
        let responder = Uuid::new_v4();
        ledger
            .open_wallet(responder, WalletOwnerKind::Responder, dec(100))
            .await;

        let detail = PaymentDetail::Upi {
            upi_id: "responder@upi".into(),
        };
        let hold = ledger.place_hold(responder, dec(60), &detail).await.unwrap();
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(40));

        let resolved = ledger.resolve_hold(hold.id, false).await.unwrap();
        assert_eq!(resolved.state, WithdrawalState::Failed);
        assert_eq!(resolved.approval, ApprovalState::Rejected);
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(100));

        // Double resolution loses.
        let err = ledger.resolve_hold(hold.id, true).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyResolved));
        assert_eq!(ledger.wallet(responder).await.unwrap().balance, dec(100));
    }

    #[tokio::test]
    async fn failed_deposit_records_audit_without_credit() {
        let ledger = MemLedgerStore::new();
        let requester = Uuid::new_v4();

        let outcome = ledger
            .deposit(requester, dec(500), "ord_2", false)
            .await
            .unwrap();
        assert_eq!(outcome, DepositOutcome::Rejected);
        assert!(matches!(
            ledger.wallet(requester).await,
            Err(CoreError::NotFound)
        ));
        let movements = ledger.movements().await;
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].status, MovementStatus::Failed);
        assert_eq!(movements[0].reference.as_deref(), Some("ord_2"));
    }
}
