//! ExpiryWatcher processor.
//!
//! Consumes `ExpiryFired` hints from the scheduler and drives the missed
//! transition through the coordinator. The conditional update inside the
//! store decides the race against late accepts; this loop only reports
//! the outcome.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::coordinator::MatchingCoordinator;
use crate::error::CoreError;
use crate::events::{ExpiryFired, ExpiryFiredReceiver};

pub struct ExpiryWatcher {
    coordinator: Arc<MatchingCoordinator>,
    fired_rx: ExpiryFiredReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl ExpiryWatcher {
    pub fn new(
        coordinator: Arc<MatchingCoordinator>,
        fired_rx: ExpiryFiredReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            coordinator,
            fired_rx,
            shutdown_rx,
        }
    }

    /// Run the ExpiryWatcher.
    pub async fn run(mut self) {
        info!("ExpiryWatcher started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("ExpiryWatcher received shutdown signal");
                        break;
                    }
                }

                Some(fired) = self.fired_rx.recv() => {
                    self.handle(fired).await;
                }

                else => {
                    info!("ExpiryFired channel closed");
                    break;
                }
            }
        }

        info!("ExpiryWatcher shutdown complete");
    }

    async fn handle(&self, fired: ExpiryFired) {
        match self.coordinator.expire(fired.request_id).await {
            Ok(_) => {}
            Err(CoreError::AlreadyResolved) => {
                // The responder answered in the last instant; the timer
                // hint arrived second and loses cleanly.
                debug!(request_id = %fired.request_id, "expiry lost to a response");
            }
            Err(CoreError::NotFound) => {
                warn!(request_id = %fired.request_id, "expiry fired for unknown request");
            }
            Err(err) => {
                error!(request_id = %fired.request_id, error = %err, "failed to expire request");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::availability::StaticAvailabilityProbe;
    use crate::config::{ConfigStore, MatchingConfig};
    use crate::entities::{RequestState, SessionKind};
    use crate::events::{expiry_fired_channel, session_event_channel};
    use crate::registry::{MemRequestStore, RequestStore};
    use crate::scheduler::ExpiryScheduler;

    #[tokio::test(start_paused = true)]
    async fn unanswered_request_becomes_missed_end_to_end() {
        let store = Arc::new(MemRequestStore::new());
        let responder = Uuid::new_v4();
        let (expiry_tx, expiry_rx) = expiry_fired_channel();
        let (event_tx, mut events) = session_event_channel();
        let coordinator = Arc::new(MatchingCoordinator::new(
            Arc::clone(&store) as Arc<dyn RequestStore>,
            Arc::new(StaticAvailabilityProbe::new([responder])),
            ExpiryScheduler::new(expiry_tx),
            event_tx,
            ConfigStore::new(MatchingConfig::default()),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = ExpiryWatcher::new(Arc::clone(&coordinator), expiry_rx, shutdown_rx);
        let watcher_handle = tokio::spawn(watcher.run());

        let request = coordinator
            .request(Uuid::new_v4(), responder, SessionKind::Voice)
            .await
            .unwrap();
        // Drain the created event.
        events.recv().await.unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;

        // The watcher picks up the fired timer and resolves the request.
        let resolved = events.recv().await.unwrap();
        assert_eq!(resolved.request().id, request.id);
        assert_eq!(
            store.get(request.id).await.unwrap().state,
            RequestState::Missed
        );
        assert_eq!(store.missed_interactions().await.len(), 1);

        shutdown_tx.send(true).unwrap();
        watcher_handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_hint_is_ignored() {
        let store = Arc::new(MemRequestStore::new());
        let responder = Uuid::new_v4();
        let (expiry_tx, expiry_rx) = expiry_fired_channel();
        let (event_tx, _events) = session_event_channel();
        let coordinator = Arc::new(MatchingCoordinator::new(
            Arc::clone(&store) as Arc<dyn RequestStore>,
            Arc::new(StaticAvailabilityProbe::new([responder])),
            ExpiryScheduler::new(expiry_tx.clone()),
            event_tx,
            ConfigStore::new(MatchingConfig::default()),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = ExpiryWatcher::new(Arc::clone(&coordinator), expiry_rx, shutdown_rx);
        let watcher_handle = tokio::spawn(watcher.run());

        let request = coordinator
            .request(Uuid::new_v4(), responder, SessionKind::Chat)
            .await
            .unwrap();
        coordinator.respond(request.id, true).await.unwrap();

        // Inject a stale hint for the already accepted request.
        expiry_tx.send(ExpiryFired { request_id: request.id }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            store.get(request.id).await.unwrap().state,
            RequestState::Accepted
        );
        assert!(store.missed_interactions().await.is_empty());

        shutdown_tx.send(true).unwrap();
        watcher_handle.await.unwrap();
    }
}
