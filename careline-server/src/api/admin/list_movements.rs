use axum::{
    Json,
    extract::{Path, Query},
    response::IntoResponse,
};
use careline_core::entities::ledger_movement::ListMovementsForOwner;
use careline_core::framework::DatabaseProcessor;
use careline_sdk::objects::admin::{PageQuery, clamp_pagination};
use kanau::processor::Processor;
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `GET /wallets/{owner_id}/movements` — the wallet's audit trail, newest
/// first. Includes movements where the owner appears on either side.
pub async fn list_movements(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let movements = processor
        .process(ListMovementsForOwner {
            owner_id,
            limit,
            offset,
        })
        .await
        .map_err(AdminApiError::Database)?;

    let response: Vec<_> = movements.iter().map(|m| m.to_response()).collect();
    Ok(Json(response))
}
