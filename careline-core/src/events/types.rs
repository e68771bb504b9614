//! Event type definitions for the event-driven architecture.
//!
//! Session events are ephemeral notifications: delivery is best-effort and
//! the database row is always the source of truth. A consumer that misses
//! an event can re-read the request by id.

use careline_sdk::objects::ws::{WsServerMessage, WsSessionEvent};
use uuid::Uuid;

use crate::entities::connection_request::ConnectionRequest;

/// Event emitted when a connection request changes state.
///
/// Carries the full request snapshot so notifiers can render a payload
/// without another database round trip.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new pending request was created; the responder should be pinged.
    RequestCreated { request: ConnectionRequest },
    /// A pending request reached a terminal state (accepted, rejected, or
    /// missed); both sides should learn the outcome.
    RequestResolved { request: ConnectionRequest },
}

impl SessionEvent {
    /// The actors this event should be delivered to.
    pub fn targets(&self) -> Vec<Uuid> {
        match self {
            SessionEvent::RequestCreated { request } => vec![request.responder_id],
            SessionEvent::RequestResolved { request } => {
                vec![request.requester_id, request.responder_id]
            }
        }
    }

    pub fn request(&self) -> &ConnectionRequest {
        match self {
            SessionEvent::RequestCreated { request } => request,
            SessionEvent::RequestResolved { request } => request,
        }
    }

    /// Render the websocket wire form of this event.
    pub fn to_ws(&self) -> WsServerMessage {
        let event = match self {
            SessionEvent::RequestCreated { request } => WsSessionEvent::RequestCreated {
                request: request.to_response(),
            },
            SessionEvent::RequestResolved { request } => WsSessionEvent::RequestResolved {
                request: request.to_response(),
            },
        };
        WsServerMessage::Event { event }
    }
}

/// Event emitted by the expiry scheduler when a request's response window
/// elapses. Carries only the id; the watcher re-checks current state
/// against the database before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryFired {
    pub request_id: Uuid,
}
