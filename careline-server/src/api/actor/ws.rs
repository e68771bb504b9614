use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use careline_sdk::objects::ws::WsCloseCode;
use uuid::Uuid;

use crate::api::extractors::VerifiedUrl;
use crate::state::AppState;

/// `GET /{actor_id}/ws` — live event stream for one actor.
///
/// Upgrades the HTTP connection to a WebSocket and pushes
/// [`WsServerMessage`] JSON frames for every matching event addressed to
/// this actor. A newer connection for the same actor supersedes this one,
/// which is closed with code `4001`.
///
/// [`WsServerMessage`]: careline_sdk::objects::ws::WsServerMessage
pub(super) async fn actor_ws(
    state: State<AppState>,
    _verified: VerifiedUrl,
    Path(actor_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_actor_ws(socket, app_state, actor_id))
}

/// Background task that drives a single live channel connection.
///
/// 1. Registers the live channel (replacing any previous one) and marks
///    the actor online in the presence table.
/// 2. Forwards session events as JSON frames until the client disconnects
///    or a newer connection replaces this one.
/// 3. On a normal disconnect, evicts the channel and marks the actor
///    offline. A superseded connection leaves both to its successor.
async fn handle_actor_ws(mut socket: WebSocket, state: AppState, actor_id: Uuid) {
    let (mut event_rx, handle) = state.live.register(actor_id).await;

    if let Err(e) = state.presence.set_online(actor_id, true).await {
        tracing::warn!(error = %e, %actor_id, "WS: failed to mark actor online");
    }
    tracing::info!(%actor_id, "WS: live channel opened");

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        if send_json(&mut socket, &event.to_ws()).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // The registry dropped our sender: a newer
                        // connection for this actor took over. Presence
                        // and eviction now belong to the successor.
                        let _ = socket
                            .send(Message::Close(Some(CloseFrame {
                                code: WsCloseCode::SUPERSEDED,
                                reason: "superseded by a newer connection".into(),
                            })))
                            .await;
                        tracing::info!(%actor_id, "WS: live channel superseded");
                        return;
                    }
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {
                    }
                    Some(Err(_)) => {
                        break;
                    }
                }
            }
        }
    }

    state.live.evict(actor_id, &handle).await;
    if let Err(e) = state.presence.set_online(actor_id, false).await {
        tracing::warn!(error = %e, %actor_id, "WS: failed to mark actor offline");
    }
    tracing::info!(%actor_id, "WS: live channel closed");
    let _ = socket.send(Message::Close(None)).await;
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
