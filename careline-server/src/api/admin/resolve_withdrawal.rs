use axum::{Json, extract::Path, response::IntoResponse};
use careline_sdk::objects::ResolveWithdrawal;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `POST /withdrawals/{id}/resolve` — approve or reject a pending
/// withdrawal.
///
/// Approval finalizes the payout; rejection refunds the held amount back
/// to the responder wallet. Exactly one decision sticks; a repeat gets
/// `409`.
pub async fn resolve_withdrawal(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(withdrawal_id): Path<i64>,
    Json(payload): Json<ResolveWithdrawal>,
) -> Result<impl IntoResponse, AdminApiError> {
    let withdrawal = state
        .settlement
        .resolve_withdrawal(withdrawal_id, payload.approve)
        .await?;
    Ok(Json(withdrawal.to_response()))
}
