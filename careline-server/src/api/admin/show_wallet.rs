use axum::{Json, extract::Path, response::IntoResponse};
use careline_core::entities::wallet::GetWalletByOwner;
use careline_core::framework::DatabaseProcessor;
use kanau::processor::Processor;
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `GET /wallets/{owner_id}` — show one wallet.
pub async fn show_wallet(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(owner_id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let wallet = processor
        .process(GetWalletByOwner { owner_id })
        .await
        .map_err(AdminApiError::Database)?
        .ok_or(AdminApiError::NotFound)?;

    Ok(Json(wallet.to_response()))
}
