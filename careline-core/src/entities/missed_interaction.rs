use careline_sdk::objects::admin::MissedInteractionResponse;
use kanau::processor::Processor;
use uuid::Uuid;

use crate::entities::connection_request::ConnectionRequest;
use crate::entities::{SessionKind, unix_seconds};
use crate::framework::DatabaseProcessor;

/// Permanent record of a request the responder never answered in time.
/// Written in the same transaction that flips the request to `missed`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MissedInteraction {
    pub id: i64,
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    pub kind: SessionKind,
    pub created_at: time::PrimitiveDateTime,
}

impl MissedInteraction {
    pub fn to_response(&self) -> MissedInteractionResponse {
        MissedInteractionResponse {
            id: self.id,
            request_id: self.request_id,
            requester_id: self.requester_id,
            responder_id: self.responder_id,
            kind: self.kind.into(),
            created_at: unix_seconds(self.created_at),
        }
    }

    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        request: &ConnectionRequest,
    ) -> Result<MissedInteraction, sqlx::Error> {
        sqlx::query_as::<_, MissedInteraction>(
            r#"
            INSERT INTO missed_interactions (request_id, requester_id, responder_id, kind)
            VALUES ($1, $2, $3, $4)
            RETURNING id, request_id, requester_id, responder_id, kind, created_at
            "#,
        )
        .bind(request.id)
        .bind(request.requester_id)
        .bind(request.responder_id)
        .bind(request.kind)
        .fetch_one(&mut **tx)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
/// List a responder's missed interactions, newest first.
pub struct ListMissedForResponder {
    pub responder_id: Uuid,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListMissedForResponder> for DatabaseProcessor {
    type Output = Vec<MissedInteraction>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListMissedForResponder")]
    async fn process(
        &self,
        query: ListMissedForResponder,
    ) -> Result<Vec<MissedInteraction>, sqlx::Error> {
        sqlx::query_as::<_, MissedInteraction>(
            r#"
            SELECT id, request_id, requester_id, responder_id, kind, created_at
            FROM missed_interactions
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
