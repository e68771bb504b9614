use axum::{
    Json,
    extract::{Path, Query},
    response::IntoResponse,
};
use careline_core::entities::connection_request::ListRequestsForResponder;
use careline_core::framework::DatabaseProcessor;
use careline_sdk::objects::admin::{PageQuery, clamp_pagination};
use kanau::processor::Processor;
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `GET /responders/{responder_id}/requests` — list a responder's
/// connection requests, newest first.
pub async fn list_requests(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(responder_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let requests = processor
        .process(ListRequestsForResponder {
            responder_id,
            limit,
            offset,
        })
        .await
        .map_err(AdminApiError::Database)?;

    let response: Vec<_> = requests.iter().map(|r| r.to_response()).collect();
    Ok(Json(response))
}
