use careline_sdk::objects::{PaymentDetail, WithdrawalResponse};
use compact_str::CompactString;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::{ApprovalState, PayoutMethod, WithdrawalState, unix_seconds};
use crate::framework::DatabaseProcessor;

/// A responder's cash-out request. The amount is held out of the wallet
/// while `state = 'pending'`; approval pays it out, rejection refunds it.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WithdrawalRequest {
    pub id: i64,
    pub responder_id: Uuid,
    pub amount: Decimal,
    pub method: PayoutMethod,
    pub upi_id: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub state: WithdrawalState,
    pub approval: ApprovalState,
    pub created_at: time::PrimitiveDateTime,
    pub resolved_at: Option<time::PrimitiveDateTime>,
}

impl WithdrawalRequest {
    pub fn to_response(&self) -> WithdrawalResponse {
        WithdrawalResponse {
            id: self.id,
            responder_id: self.responder_id,
            amount: self.amount,
            state: self.state.into(),
            approval: self.approval.into(),
            created_at: unix_seconds(self.created_at),
        }
    }

    /// Reassemble the tagged payout detail from the flattened columns.
    /// Rows written through [`insert_tx`] always carry the columns their
    /// method needs; anything else is a data bug surfaced as `None`.
    ///
    /// [`insert_tx`]: WithdrawalRequest::insert_tx
    pub fn payment_detail(&self) -> Option<PaymentDetail> {
        match self.method {
            PayoutMethod::Upi => Some(PaymentDetail::Upi {
                upi_id: CompactString::from(self.upi_id.as_deref()?),
            }),
            PayoutMethod::Bank => Some(PaymentDetail::Bank {
                account_number: CompactString::from(self.account_number.as_deref()?),
                ifsc_code: CompactString::from(self.ifsc_code.as_deref()?),
            }),
        }
    }

    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        responder_id: Uuid,
        amount: Decimal,
        detail: &PaymentDetail,
    ) -> Result<WithdrawalRequest, sqlx::Error> {
        let method = PayoutMethod::from(detail);
        let (upi_id, account_number, ifsc_code) = match detail {
            PaymentDetail::Upi { upi_id } => (Some(upi_id.as_str()), None, None),
            PaymentDetail::Bank {
                account_number,
                ifsc_code,
            } => (None, Some(account_number.as_str()), Some(ifsc_code.as_str())),
        };
        sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            INSERT INTO withdrawal_requests
                (responder_id, amount, method, upi_id, account_number, ifsc_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, responder_id, amount, method, upi_id, account_number,
                      ifsc_code, state, approval, created_at, resolved_at
            "#,
        )
        .bind(responder_id)
        .bind(amount)
        .bind(method)
        .bind(upi_id)
        .bind(account_number)
        .bind(ifsc_code)
        .fetch_one(&mut **tx)
        .await
    }

    /// Resolve a pending withdrawal. Same conditional-update discipline as
    /// request transitions: `None` means somebody already resolved it.
    pub async fn resolve_if_pending_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: i64,
        state: WithdrawalState,
        approval: ApprovalState,
    ) -> Result<Option<WithdrawalRequest>, sqlx::Error> {
        sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            UPDATE withdrawal_requests
            SET state = $2, approval = $3, resolved_at = now()
            WHERE id = $1 AND state = 'pending'
            RETURNING id, responder_id, amount, method, upi_id, account_number,
                      ifsc_code, state, approval, created_at, resolved_at
            "#,
        )
        .bind(id)
        .bind(state)
        .bind(approval)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn get(
        pool: &sqlx::PgPool,
        id: i64,
    ) -> Result<Option<WithdrawalRequest>, sqlx::Error> {
        sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            SELECT id, responder_id, amount, method, upi_id, account_number,
                   ifsc_code, state, approval, created_at, resolved_at
            FROM withdrawal_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
/// Withdrawals awaiting an admin decision, oldest first.
pub struct ListPendingWithdrawals {
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListPendingWithdrawals> for DatabaseProcessor {
    type Output = Vec<WithdrawalRequest>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListPendingWithdrawals")]
    async fn process(
        &self,
        query: ListPendingWithdrawals,
    ) -> Result<Vec<WithdrawalRequest>, sqlx::Error> {
        sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            SELECT id, responder_id, amount, method, upi_id, account_number,
                   ifsc_code, state, approval, created_at, resolved_at
            FROM withdrawal_requests
            WHERE state = 'pending'
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
    }
}
