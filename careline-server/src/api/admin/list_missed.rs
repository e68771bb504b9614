use axum::{
    Json,
    extract::{Path, Query},
    response::IntoResponse,
};
use careline_core::entities::missed_interaction::ListMissedForResponder;
use careline_core::framework::DatabaseProcessor;
use careline_sdk::objects::admin::{PageQuery, clamp_pagination};
use kanau::processor::Processor;
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `GET /responders/{responder_id}/missed` — list a responder's missed
/// interactions, newest first.
pub async fn list_missed(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(responder_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let missed = processor
        .process(ListMissedForResponder {
            responder_id,
            limit,
            offset,
        })
        .await
        .map_err(AdminApiError::Database)?;

    let response: Vec<_> = missed.iter().map(|m| m.to_response()).collect();
    Ok(Json(response))
}
