use careline_sdk::objects::RequestResponse;
use kanau::processor::Processor;
use uuid::Uuid;

use crate::entities::{RequestState, SessionKind, unix_seconds};
use crate::framework::DatabaseProcessor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    pub kind: SessionKind,
    pub state: RequestState,
    pub created_at: time::PrimitiveDateTime,
}

impl ConnectionRequest {
    pub fn to_response(&self) -> RequestResponse {
        RequestResponse {
            request_id: self.id,
            requester_id: self.requester_id,
            responder_id: self.responder_id,
            kind: self.kind.into(),
            state: self.state.into(),
            created_at: unix_seconds(self.created_at),
        }
    }

    /// Insert a new pending request. Fails with a unique violation when the
    /// pair already has a pending request (partial unique index).
    pub async fn insert_pending(
        pool: &sqlx::PgPool,
        requester_id: Uuid,
        responder_id: Uuid,
        kind: SessionKind,
    ) -> Result<ConnectionRequest, sqlx::Error> {
        sqlx::query_as::<_, ConnectionRequest>(
            r#"
            INSERT INTO connection_requests (requester_id, responder_id, kind)
            VALUES ($1, $2, $3)
            RETURNING id, requester_id, responder_id, kind, state, created_at
            "#,
        )
        .bind(requester_id)
        .bind(responder_id)
        .bind(kind)
        .fetch_one(pool)
        .await
    }

    /// Move a request out of `pending` into a terminal state. The `WHERE
    /// state = 'pending'` guard is the single linearization point for the
    /// accept/reject/expiry race: exactly one caller gets `Some`, everyone
    /// else gets `None`.
    pub async fn transition_if_pending(
        pool: &sqlx::PgPool,
        id: Uuid,
        to: RequestState,
    ) -> Result<Option<ConnectionRequest>, sqlx::Error> {
        sqlx::query_as::<_, ConnectionRequest>(
            r#"
            UPDATE connection_requests
            SET state = $2
            WHERE id = $1 AND state = 'pending'
            RETURNING id, requester_id, responder_id, kind, state, created_at
            "#,
        )
        .bind(id)
        .bind(to)
        .fetch_optional(pool)
        .await
    }

    /// Transaction-scoped variant of [`transition_if_pending`], used when
    /// the transition must commit together with a `missed_interactions` row.
    ///
    /// [`transition_if_pending`]: ConnectionRequest::transition_if_pending
    pub async fn transition_if_pending_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        to: RequestState,
    ) -> Result<Option<ConnectionRequest>, sqlx::Error> {
        sqlx::query_as::<_, ConnectionRequest>(
            r#"
            UPDATE connection_requests
            SET state = $2
            WHERE id = $1 AND state = 'pending'
            RETURNING id, requester_id, responder_id, kind, state, created_at
            "#,
        )
        .bind(id)
        .bind(to)
        .fetch_optional(&mut **tx)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetConnectionRequestById {
    pub id: Uuid,
}

impl Processor<GetConnectionRequestById> for DatabaseProcessor {
    type Output = Option<ConnectionRequest>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetConnectionRequestById")]
    async fn process(
        &self,
        query: GetConnectionRequestById,
    ) -> Result<Option<ConnectionRequest>, sqlx::Error> {
        sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, requester_id, responder_id, kind, state, created_at
            FROM connection_requests
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
/// List a responder's requests, newest first.
pub struct ListRequestsForResponder {
    pub responder_id: Uuid,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListRequestsForResponder> for DatabaseProcessor {
    type Output = Vec<ConnectionRequest>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListRequestsForResponder")]
    async fn process(
        &self,
        query: ListRequestsForResponder,
    ) -> Result<Vec<ConnectionRequest>, sqlx::Error> {
        sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, requester_id, responder_id, kind, state, created_at
            FROM connection_requests
            WHERE responder_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.responder_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
/// Requests still pending at startup, for re-arming expiry timers after a
/// restart.
pub struct ListPendingRequests;

impl Processor<ListPendingRequests> for DatabaseProcessor {
    type Output = Vec<ConnectionRequest>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListPendingRequests")]
    async fn process(
        &self,
        _query: ListPendingRequests,
    ) -> Result<Vec<ConnectionRequest>, sqlx::Error> {
        sqlx::query_as::<_, ConnectionRequest>(
            r#"
            SELECT id, requester_id, responder_id, kind, state, created_at
            FROM connection_requests
            WHERE state = 'pending'
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
