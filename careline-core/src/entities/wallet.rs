use careline_sdk::objects::WalletResponse;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::WalletOwnerKind;
use crate::framework::DatabaseProcessor;

/// Owner id of the platform wallet that absorbs the non-responder share of
/// every session charge. Seeded by the initial migration.
pub const PLATFORM_OWNER_ID: Uuid = Uuid::nil();

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Wallet {
    pub owner_id: Uuid,
    pub owner_kind: WalletOwnerKind,
    pub balance: Decimal,
    pub updated_at: time::PrimitiveDateTime,
}

impl Wallet {
    pub fn to_response(&self) -> WalletResponse {
        WalletResponse {
            owner_id: self.owner_id,
            owner_kind: self.owner_kind.into(),
            balance: self.balance,
        }
    }

    pub async fn fetch(
        pool: &sqlx::PgPool,
        owner_id: Uuid,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        sqlx::query_as::<_, Wallet>(
            r#"
            SELECT owner_id, owner_kind, balance, updated_at
            FROM wallets
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    /// Debit only if the balance covers the amount. `None` means
    /// insufficient funds (or no wallet); the caller decides which by
    /// fetching the row.
    pub async fn try_debit_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        sqlx::query_as::<_, Wallet>(
            r#"
            UPDATE wallets
            SET balance = balance - $2, updated_at = now()
            WHERE owner_id = $1 AND balance >= $2
            RETURNING owner_id, owner_kind, balance, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(amount)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Credit an existing wallet, creating it on first touch. The owner
    /// kind only applies on insert; an existing row keeps its kind.
    pub async fn credit_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: Uuid,
        owner_kind: WalletOwnerKind,
        amount: Decimal,
    ) -> Result<Wallet, sqlx::Error> {
        sqlx::query_as::<_, Wallet>(
            r#"
            INSERT INTO wallets (owner_id, owner_kind, balance)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id)
            DO UPDATE SET balance = wallets.balance + $3, updated_at = now()
            RETURNING owner_id, owner_kind, balance, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(owner_kind)
        .bind(amount)
        .fetch_one(&mut **tx)
        .await
    }

    /// Lock the row for the rest of the transaction. Serializes concurrent
    /// penalty and refund against the same wallet.
    pub async fn fetch_for_update_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: Uuid,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        sqlx::query_as::<_, Wallet>(
            r#"
            SELECT owner_id, owner_kind, balance, updated_at
            FROM wallets
            WHERE owner_id = $1
            FOR UPDATE
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetWalletByOwner {
    pub owner_id: Uuid,
}

impl Processor<GetWalletByOwner> for DatabaseProcessor {
    type Output = Option<Wallet>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetWalletByOwner")]
    async fn process(&self, query: GetWalletByOwner) -> Result<Option<Wallet>, sqlx::Error> {
        Wallet::fetch(&self.pool, query.owner_id).await
    }
}
