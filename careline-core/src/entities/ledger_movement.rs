use careline_sdk::objects::MovementResponse;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::{MovementPurpose, MovementStatus, SessionKind, unix_seconds};
use crate::framework::DatabaseProcessor;

/// One row of the append-only audit trail. Every balance change, including
/// failed attempts, leaves a movement behind.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LedgerMovement {
    pub id: i64,
    pub source_owner: Option<Uuid>,
    pub dest_owner: Option<Uuid>,
    pub amount: Decimal,
    pub purpose: MovementPurpose,
    pub status: MovementStatus,
    pub kind: Option<SessionKind>,
    pub duration_secs: Option<i32>,
    pub reference: Option<String>,
    pub withdrawal_id: Option<i64>,
    pub created_at: time::PrimitiveDateTime,
}

impl LedgerMovement {
    pub fn to_response(&self) -> MovementResponse {
        MovementResponse {
            id: self.id,
            source_owner: self.source_owner,
            dest_owner: self.dest_owner,
            amount: self.amount,
            purpose: self.purpose.into(),
            status: self.status.into(),
            created_at: unix_seconds(self.created_at),
        }
    }
}

/// Data for appending a movement. Optional columns default to `None`; use
/// the builder-style setters for the ones a given purpose needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub source_owner: Option<Uuid>,
    pub dest_owner: Option<Uuid>,
    pub amount: Decimal,
    pub purpose: MovementPurpose,
    pub status: MovementStatus,
    pub kind: Option<SessionKind>,
    pub duration_secs: Option<i32>,
    pub reference: Option<String>,
    pub withdrawal_id: Option<i64>,
}

impl NewMovement {
    pub fn new(purpose: MovementPurpose, status: MovementStatus, amount: Decimal) -> Self {
        Self {
            source_owner: None,
            dest_owner: None,
            amount,
            purpose,
            status,
            kind: None,
            duration_secs: None,
            reference: None,
            withdrawal_id: None,
        }
    }

    pub fn from_owner(mut self, owner: Uuid) -> Self {
        self.source_owner = Some(owner);
        self
    }

    pub fn to_owner(mut self, owner: Uuid) -> Self {
        self.dest_owner = Some(owner);
        self
    }

    pub fn session(mut self, kind: SessionKind, duration_secs: Option<i32>) -> Self {
        self.kind = Some(kind);
        self.duration_secs = duration_secs;
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn withdrawal(mut self, withdrawal_id: i64) -> Self {
        self.withdrawal_id = Some(withdrawal_id);
        self
    }

    pub async fn insert(self, pool: &sqlx::PgPool) -> Result<LedgerMovement, sqlx::Error> {
        sqlx::query_as::<_, LedgerMovement>(INSERT_MOVEMENT)
            .bind(self.source_owner)
            .bind(self.dest_owner)
            .bind(self.amount)
            .bind(self.purpose)
            .bind(self.status)
            .bind(self.kind)
            .bind(self.duration_secs)
            .bind(self.reference)
            .bind(self.withdrawal_id)
            .fetch_one(pool)
            .await
    }

    pub async fn insert_tx(
        self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<LedgerMovement, sqlx::Error> {
        sqlx::query_as::<_, LedgerMovement>(INSERT_MOVEMENT)
            .bind(self.source_owner)
            .bind(self.dest_owner)
            .bind(self.amount)
            .bind(self.purpose)
            .bind(self.status)
            .bind(self.kind)
            .bind(self.duration_secs)
            .bind(self.reference)
            .bind(self.withdrawal_id)
            .fetch_one(&mut **tx)
            .await
    }
}

const INSERT_MOVEMENT: &str = r#"
INSERT INTO ledger_movements
    (source_owner, dest_owner, amount, purpose, status, kind, duration_secs, reference, withdrawal_id)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
RETURNING id, source_owner, dest_owner, amount, purpose, status, kind,
          duration_secs, reference, withdrawal_id, created_at
"#;

impl LedgerMovement {
    /// Flip the pending hold movement of a withdrawal to its final status.
    pub async fn mark_withdrawal_resolved_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        withdrawal_id: i64,
        status: MovementStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_movements
            SET status = $2
            WHERE withdrawal_id = $1 AND purpose = 'withdrawal' AND status = 'pending'
            "#,
        )
        .bind(withdrawal_id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, Copy)]
/// Audit trail of one wallet, newest first. Matches movements where the
/// owner appears on either side.
pub struct ListMovementsForOwner {
    pub owner_id: Uuid,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListMovementsForOwner> for DatabaseProcessor {
    type Output = Vec<LedgerMovement>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListMovementsForOwner")]
    async fn process(
        &self,
        query: ListMovementsForOwner,
    ) -> Result<Vec<LedgerMovement>, sqlx::Error> {
        sqlx::query_as::<_, LedgerMovement>(
            r#"
            SELECT id, source_owner, dest_owner, amount, purpose, status, kind,
                   duration_secs, reference, withdrawal_id, created_at
            FROM ledger_movements
            WHERE source_owner = $1 OR dest_owner = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.owner_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
    }
}
