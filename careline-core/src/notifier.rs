//! Delivery of session events to actors.
//!
//! Delivery is best-effort by contract: the request row is the source of
//! truth and clients re-read it on reconnect. Failures are logged, never
//! propagated into the matching state machine.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use url::Url;
use uuid::Uuid;

use crate::events::SessionEvent;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one event to one actor.
    async fn notify(&self, actor_id: Uuid, event: &SessionEvent);
}

/// Per-connection buffer for live channels. Small: a client this far
/// behind is better served by a reconnect-and-reread.
const LIVE_CHANNEL_BUFFER: usize = 16;

/// Routes events to connected websocket clients.
///
/// The server's ws handler registers a sender per connected actor; a new
/// connection for the same actor supersedes the old one.
#[derive(Default)]
pub struct LiveChannelNotifier {
    channels: RwLock<HashMap<Uuid, mpsc::Sender<SessionEvent>>>,
}

impl LiveChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection for an actor, replacing any previous
    /// one. The map holds the only strong sender, so a superseded
    /// connection observes its receiver closing. The weak handle
    /// identifies this registration to [`evict`](Self::evict).
    pub async fn register(
        &self,
        actor_id: Uuid,
    ) -> (
        mpsc::Receiver<SessionEvent>,
        mpsc::WeakSender<SessionEvent>,
    ) {
        let (tx, rx) = mpsc::channel(LIVE_CHANNEL_BUFFER);
        let handle = tx.downgrade();
        self.channels.write().await.insert(actor_id, tx);
        (rx, handle)
    }

    /// Drop the actor's channel, unless a newer connection already
    /// replaced it (the stale handle no longer upgrades or points at a
    /// different channel).
    pub async fn evict(&self, actor_id: Uuid, handle: &mpsc::WeakSender<SessionEvent>) {
        let Some(sender) = handle.upgrade() else {
            return;
        };
        let mut channels = self.channels.write().await;
        if channels
            .get(&actor_id)
            .is_some_and(|current| current.same_channel(&sender))
        {
            channels.remove(&actor_id);
        }
    }

    /// The current sender for an actor, if connected.
    pub async fn sender_for(&self, actor_id: Uuid) -> Option<mpsc::Sender<SessionEvent>> {
        self.channels.read().await.get(&actor_id).cloned()
    }

    pub async fn connected(&self, actor_id: Uuid) -> bool {
        self.channels.read().await.contains_key(&actor_id)
    }
}

#[async_trait]
impl Notifier for LiveChannelNotifier {
    async fn notify(&self, actor_id: Uuid, event: &SessionEvent) {
        let Some(sender) = self.sender_for(actor_id).await else {
            tracing::debug!(%actor_id, "no live channel, event skipped");
            return;
        };
        if let Err(err) = sender.try_send(event.clone()) {
            tracing::warn!(%actor_id, error = %err, "live channel full or closed, event dropped");
        }
    }
}

/// Forwards events to an external push gateway over HTTP, for actors who
/// are not connected live (mobile push, etc.). Fire-and-forget.
pub struct PushGatewayNotifier {
    http: reqwest::Client,
    endpoint: Url,
}

impl PushGatewayNotifier {
    pub fn new(endpoint: Url) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { http, endpoint }
    }
}

#[async_trait]
impl Notifier for PushGatewayNotifier {
    async fn notify(&self, actor_id: Uuid, event: &SessionEvent) {
        let payload = serde_json::json!({
            "actor_id": actor_id,
            "event": event.to_ws(),
        });
        match self.http.post(self.endpoint.clone()).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                tracing::warn!(%actor_id, status = %resp.status(), "push gateway rejected event");
            }
            Err(err) => {
                tracing::warn!(%actor_id, error = %err, "push gateway unreachable");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::connection_request::ConnectionRequest;
    use crate::entities::{RequestState, SessionKind, now_primitive};

    fn sample_event() -> SessionEvent {
        SessionEvent::RequestCreated {
            request: ConnectionRequest {
                id: Uuid::new_v4(),
                requester_id: Uuid::new_v4(),
                responder_id: Uuid::new_v4(),
                kind: SessionKind::Voice,
                state: RequestState::Pending,
                created_at: now_primitive(),
            },
        }
    }

    #[tokio::test]
    async fn notify_reaches_the_registered_channel() {
        let notifier = LiveChannelNotifier::new();
        let actor = Uuid::new_v4();
        let (mut rx, _handle) = notifier.register(actor).await;

        notifier.notify(actor, &sample_event()).await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn new_connection_supersedes_the_old_one() {
        let notifier = LiveChannelNotifier::new();
        let actor = Uuid::new_v4();

        let (mut old_rx, _old_handle) = notifier.register(actor).await;
        let (mut new_rx, _new_handle) = notifier.register(actor).await;

        // The old receiver sees its channel close.
        assert!(old_rx.recv().await.is_none());

        notifier.notify(actor, &sample_event()).await;
        assert!(new_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn evict_only_removes_its_own_registration() {
        let notifier = LiveChannelNotifier::new();
        let actor = Uuid::new_v4();

        let (_old_rx, old_handle) = notifier.register(actor).await;

        // A reconnect lands before the old connection's cleanup runs.
        let (_new_rx, new_handle) = notifier.register(actor).await;
        notifier.evict(actor, &old_handle).await;
        assert!(notifier.connected(actor).await);

        notifier.evict(actor, &new_handle).await;
        assert!(!notifier.connected(actor).await);
    }
}
