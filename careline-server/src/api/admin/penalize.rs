use axum::{Json, extract::Path, response::IntoResponse};
use careline_sdk::objects::admin::PenaltyResponse;
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `POST /wallets/{owner_id}/penalize` — deduct the configured flat
/// penalty from a responder wallet.
///
/// The deduction is clamped to the current balance; the response reports
/// the amount actually taken.
pub async fn penalize(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(owner_id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminApiError> {
    let applied = state.settlement.apply_penalty(owner_id).await?;
    Ok(Json(PenaltyResponse {
        responder_id: owner_id,
        applied,
    }))
}
