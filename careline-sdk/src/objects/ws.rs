//! WebSocket message types for the actor live-channel stream.
//!
//! The `GET /actors/{actor_id}/ws` endpoint upgrades to a WebSocket
//! connection that represents the actor's live session. While the session
//! is open, the server pushes [`WsServerMessage`] JSON frames for every
//! matching event addressed to that actor.
//!
//! # Protocol
//!
//! 1. The client opens the socket with a signed URL (see
//!    [`crate::signature`]); the server registers the live channel.
//! 2. The server pushes [`WsServerMessage::Event`] frames as matching
//!    events occur. Delivery is at-most-once and best-effort: a slow
//!    client loses frames rather than backpressuring the core.
//! 3. Closing the socket evicts the live channel; the request state in
//!    the registry stays authoritative either way.

use serde::{Deserialize, Serialize};

use super::RequestResponse;

/// Server-to-client WebSocket message.
///
/// Serialized as an internally-tagged JSON object so the client can
/// dispatch on the `"type"` field:
///
/// ```json
/// {"type":"event","event":{"kind":"request_created","request":{ ... }}}
/// {"type":"error","code":1011,"reason":"internal error"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// A matching event addressed to this actor.
    Event { event: WsSessionEvent },

    /// A server-side error that does **not** close the connection by
    /// itself. The server may still send a close frame afterwards.
    Error { code: u16, reason: String },
}

/// The matching events an actor can receive on its live channel.
///
/// For a single request, `request_created` always precedes
/// `request_resolved`; no ordering is promised across different requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WsSessionEvent {
    /// A requester wants to connect; sent to the responder.
    RequestCreated { request: RequestResponse },

    /// The request reached a terminal state; sent to both parties with
    /// the final snapshot.
    RequestResolved { request: RequestResponse },
}

/// Well-known WebSocket close codes used by the live-channel stream.
///
/// Codes in the 4000–4999 range are reserved for application use by
/// [RFC 6455 §7.4.2](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.2).
pub struct WsCloseCode;

impl WsCloseCode {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;

    /// An unexpected server-side error prevented the connection from
    /// continuing.
    pub const INTERNAL_ERROR: u16 = 1011;

    /// A newer live channel for the same actor replaced this one.
    pub const SUPERSEDED: u16 = 4001;
}
