//! Responder availability checks.
//!
//! A request may only be created against a responder that is online and
//! not already in a session. The check is advisory (presence can change a
//! moment later); the pending-pair uniqueness and the response window are
//! what actually bound the state machine.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreResult;

#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    /// Whether the responder can currently receive a request.
    async fn is_available(&self, responder_id: Uuid) -> CoreResult<bool>;
}

/// Presence-table backed probe. A responder with no presence row has never
/// come online and counts as unavailable.
pub struct PgAvailabilityProbe {
    pool: sqlx::PgPool,
}

impl PgAvailabilityProbe {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityProbe for PgAvailabilityProbe {
    async fn is_available(&self, responder_id: Uuid) -> CoreResult<bool> {
        let available = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT online AND NOT busy
            FROM responder_presence
            WHERE responder_id = $1
            "#,
        )
        .bind(responder_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(available.unwrap_or(false))
    }
}

/// In-memory probe for tests and embedded use.
pub struct StaticAvailabilityProbe {
    available: std::collections::HashSet<Uuid>,
}

impl StaticAvailabilityProbe {
    pub fn new<I: IntoIterator<Item = Uuid>>(available: I) -> Self {
        Self {
            available: available.into_iter().collect(),
        }
    }

    /// A probe that reports every responder as available.
    pub fn always() -> AlwaysAvailable {
        AlwaysAvailable
    }
}

#[async_trait]
impl AvailabilityProbe for StaticAvailabilityProbe {
    async fn is_available(&self, responder_id: Uuid) -> CoreResult<bool> {
        Ok(self.available.contains(&responder_id))
    }
}

pub struct AlwaysAvailable;

#[async_trait]
impl AvailabilityProbe for AlwaysAvailable {
    async fn is_available(&self, _responder_id: Uuid) -> CoreResult<bool> {
        Ok(true)
    }
}

/// Presence upserts, driven by the actor websocket lifecycle and session
/// start/end.
pub struct PresenceWriter {
    pool: sqlx::PgPool,
}

impl PresenceWriter {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn set_online(&self, responder_id: Uuid, online: bool) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO responder_presence (responder_id, online)
            VALUES ($1, $2)
            ON CONFLICT (responder_id)
            DO UPDATE SET online = $2, updated_at = now()
            "#,
        )
        .bind(responder_id)
        .bind(online)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_busy(&self, responder_id: Uuid, busy: bool) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO responder_presence (responder_id, online, busy)
            VALUES ($1, true, $2)
            ON CONFLICT (responder_id)
            DO UPDATE SET busy = $2, updated_at = now()
            "#,
        )
        .bind(responder_id)
        .bind(busy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_probe_only_reports_listed_responders() {
        let listed = Uuid::new_v4();
        let probe = StaticAvailabilityProbe::new([listed]);
        assert!(probe.is_available(listed).await.unwrap());
        assert!(!probe.is_available(Uuid::new_v4()).await.unwrap());
    }
}
