use axum::{Json, extract::Query, response::IntoResponse};
use careline_core::entities::withdrawal_request::ListPendingWithdrawals;
use careline_core::framework::DatabaseProcessor;
use careline_sdk::objects::admin::{PageQuery, clamp_pagination};
use kanau::processor::Processor;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `GET /withdrawals` — list withdrawals awaiting a decision, oldest first.
pub async fn list_withdrawals(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let withdrawals = processor
        .process(ListPendingWithdrawals { limit, offset })
        .await
        .map_err(AdminApiError::Database)?;

    let response: Vec<_> = withdrawals.iter().map(|w| w.to_response()).collect();
    Ok(Json(response))
}
