//! Actor API handlers.
//!
//! The actor API carries the live channel: a websocket per connected
//! requester or responder, authenticated with a signed URL via the
//! `Careline-Signature` and `Careline-Signed-Url` headers.
//!
//! # Endpoints
//!
//! - `GET /{actor_id}/ws` – live event stream for one actor

use axum::{Router, routing::get};

use crate::state::AppState;

mod ws;

/// Build the Actor API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{actor_id}/ws", get(ws::actor_ws))
}
