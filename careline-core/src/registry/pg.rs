use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::connection_request::ConnectionRequest;
use crate::entities::missed_interaction::MissedInteraction;
use crate::entities::{RequestState, SessionKind};
use crate::error::{CoreError, CoreResult};
use crate::registry::RequestStore;

/// Postgres-backed request registry.
///
/// Relies on two pieces of the schema: the partial unique index on
/// `(requester_id, responder_id) WHERE state = 'pending'` for the
/// one-open-request rule, and conditional `UPDATE ... WHERE state =
/// 'pending'` for the single-winner transition rule.
pub struct PgRequestStore {
    pool: sqlx::PgPool,
}

impl PgRequestStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn create(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        kind: SessionKind,
    ) -> CoreResult<ConnectionRequest> {
        match ConnectionRequest::insert_pending(&self.pool, requester_id, responder_id, kind).await
        {
            Ok(request) => Ok(request),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(CoreError::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    async fn transition(&self, id: Uuid, to: RequestState) -> CoreResult<ConnectionRequest> {
        match ConnectionRequest::transition_if_pending(&self.pool, id, to).await? {
            Some(request) => Ok(request),
            None => match self.get(id).await {
                Ok(_) => Err(CoreError::AlreadyResolved),
                Err(err) => Err(err),
            },
        }
    }

    async fn transition_to_missed(&self, id: Uuid) -> CoreResult<ConnectionRequest> {
        let mut tx = self.pool.begin().await?;
        let Some(request) =
            ConnectionRequest::transition_if_pending_tx(&mut tx, id, RequestState::Missed).await?
        else {
            tx.rollback().await?;
            return match self.get(id).await {
                Ok(_) => Err(CoreError::AlreadyResolved),
                Err(err) => Err(err),
            };
        };
        MissedInteraction::insert_tx(&mut tx, &request).await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> CoreResult<ConnectionRequest> {
        sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, requester_id, responder_id, kind, state, created_at
            FROM connection_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CoreError::NotFound)
    }
}
