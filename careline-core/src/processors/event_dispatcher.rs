//! EventDispatcher processor.
//!
//! Fans each `SessionEvent` out to its target actors through the
//! configured notifiers (live websocket channels first, push gateway as a
//! fallback layer). Delivery failures never feed back into the matching
//! state machine.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::events::{SessionEvent, SessionEventReceiver};
use crate::notifier::Notifier;

pub struct EventDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    event_rx: SessionEventReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl EventDispatcher {
    pub fn new(
        notifiers: Vec<Arc<dyn Notifier>>,
        event_rx: SessionEventReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            notifiers,
            event_rx,
            shutdown_rx,
        }
    }

    /// Run the EventDispatcher.
    pub async fn run(mut self) {
        info!("EventDispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("EventDispatcher received shutdown signal");
                        break;
                    }
                }

                Some(event) = self.event_rx.recv() => {
                    self.dispatch(event).await;
                }

                else => {
                    info!("SessionEvent channel closed");
                    break;
                }
            }
        }

        info!("EventDispatcher shutdown complete");
    }

    async fn dispatch(&self, event: SessionEvent) {
        let targets = event.targets();
        debug!(request_id = %event.request().id, targets = targets.len(), "dispatching session event");
        for actor_id in targets {
            for notifier in &self.notifiers {
                notifier.notify(actor_id, &event).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::entities::connection_request::ConnectionRequest;
    use crate::entities::{RequestState, SessionKind, now_primitive};
    use crate::events::session_event_channel;
    use crate::notifier::LiveChannelNotifier;

    fn request_between(requester_id: Uuid, responder_id: Uuid) -> ConnectionRequest {
        ConnectionRequest {
            id: Uuid::new_v4(),
            requester_id,
            responder_id,
            kind: SessionKind::Voice,
            state: RequestState::Pending,
            created_at: now_primitive(),
        }
    }

    #[tokio::test]
    async fn created_event_reaches_only_the_responder() {
        let live = Arc::new(LiveChannelNotifier::new());
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());
        let (mut requester_rx, _) = live.register(requester).await;
        let (mut responder_rx, _) = live.register(responder).await;

        let (event_tx, event_rx) = session_event_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let dispatcher = EventDispatcher::new(
            vec![Arc::clone(&live) as Arc<dyn Notifier>],
            event_rx,
            shutdown_rx,
        );
        let handle = tokio::spawn(dispatcher.run());

        event_tx
            .send(SessionEvent::RequestCreated {
                request: request_between(requester, responder),
            })
            .await
            .unwrap();

        assert!(responder_rx.recv().await.is_some());
        assert!(requester_rx.try_recv().is_err());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn resolved_event_reaches_both_sides() {
        let live = Arc::new(LiveChannelNotifier::new());
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());
        let (mut requester_rx, _) = live.register(requester).await;
        let (mut responder_rx, _) = live.register(responder).await;

        let (event_tx, event_rx) = session_event_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let dispatcher = EventDispatcher::new(
            vec![Arc::clone(&live) as Arc<dyn Notifier>],
            event_rx,
            shutdown_rx,
        );
        let handle = tokio::spawn(dispatcher.run());

        let mut request = request_between(requester, responder);
        request.state = RequestState::Accepted;
        event_tx
            .send(SessionEvent::RequestResolved { request })
            .await
            .unwrap();

        assert!(requester_rx.recv().await.is_some());
        assert!(responder_rx.recv().await.is_some());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
