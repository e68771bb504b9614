//! The matching coordinator: drives a connection request through its
//! bounded lifetime.
//!
//! Created requests are `pending` for at most the configured response
//! window. An accept or reject inside the window resolves the request;
//! otherwise the expiry timer fires and it becomes `missed`. Whoever's
//! conditional update lands first wins; everyone else sees
//! `AlreadyResolved`.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::availability::AvailabilityProbe;
use crate::config::{ConfigStore, MatchingConfig};
use crate::entities::connection_request::ConnectionRequest;
use crate::entities::{RequestState, SessionKind, unix_seconds};
use crate::error::{CoreError, CoreResult, retry_read};
use crate::events::{SessionEvent, SessionEventSender};
use crate::registry::RequestStore;
use crate::scheduler::ExpiryScheduler;

pub struct MatchingCoordinator {
    registry: Arc<dyn RequestStore>,
    availability: Arc<dyn AvailabilityProbe>,
    scheduler: ExpiryScheduler,
    event_tx: SessionEventSender,
    config: ConfigStore<MatchingConfig>,
}

impl MatchingCoordinator {
    pub fn new(
        registry: Arc<dyn RequestStore>,
        availability: Arc<dyn AvailabilityProbe>,
        scheduler: ExpiryScheduler,
        event_tx: SessionEventSender,
        config: ConfigStore<MatchingConfig>,
    ) -> Self {
        Self {
            registry,
            availability,
            scheduler,
            event_tx,
            config,
        }
    }

    /// Create a pending request against an available responder and start
    /// its expiry timer.
    #[tracing::instrument(skip(self), err)]
    pub async fn request(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        kind: SessionKind,
    ) -> CoreResult<ConnectionRequest> {
        if !self.availability.is_available(responder_id).await? {
            return Err(CoreError::ResponderUnavailable);
        }

        let request = self.registry.create(requester_id, responder_id, kind).await?;
        let window = self.config.read().await.response_timeout;
        self.scheduler.arm(request.id, window).await;
        tracing::info!(request_id = %request.id, %responder_id, "connection request created");

        self.emit(SessionEvent::RequestCreated {
            request: request.clone(),
        });
        Ok(request)
    }

    /// Accept or reject a pending request.
    #[tracing::instrument(skip(self), err)]
    pub async fn respond(&self, request_id: Uuid, accept: bool) -> CoreResult<ConnectionRequest> {
        let to = if accept {
            RequestState::Accepted
        } else {
            RequestState::Rejected
        };
        let request = self.registry.transition(request_id, to).await?;
        self.scheduler.disarm(request_id).await;
        tracing::info!(%request_id, state = ?request.state, "connection request resolved");

        self.emit(SessionEvent::RequestResolved {
            request: request.clone(),
        });
        Ok(request)
    }

    /// Expire a request whose response window elapsed. Driven by the
    /// expiry watcher; losing to a concurrent respond is the normal case
    /// for a last-second accept.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn expire(&self, request_id: Uuid) -> CoreResult<ConnectionRequest> {
        let request = self.registry.transition_to_missed(request_id).await?;
        self.scheduler.disarm(request_id).await;
        tracing::info!(%request_id, "connection request missed");

        self.emit(SessionEvent::RequestResolved {
            request: request.clone(),
        });
        Ok(request)
    }

    /// Re-arm the timer of a request that was pending at startup, for the
    /// remainder of its window. A request already past its window gets an
    /// immediate timer.
    pub async fn resume(&self, request: &ConnectionRequest) {
        let window = self.config.read().await.response_timeout;
        let age = time::OffsetDateTime::now_utc().unix_timestamp() - unix_seconds(request.created_at);
        let remaining = window.saturating_sub(Duration::from_secs(age.max(0) as u64));
        self.scheduler.arm(request.id, remaining).await;
    }

    pub async fn get(&self, request_id: Uuid) -> CoreResult<ConnectionRequest> {
        retry_read(|| self.registry.get(request_id)).await
    }

    fn emit(&self, event: SessionEvent) {
        // Events are ephemeral; a full channel drops the event rather than
        // stalling the request path.
        if let Err(err) = self.event_tx.try_send(event) {
            tracing::warn!(error = %err, "session event channel full, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::StaticAvailabilityProbe;
    use crate::events::{SessionEventReceiver, expiry_fired_channel, session_event_channel};
    use crate::registry::MemRequestStore;

    struct Harness {
        coordinator: MatchingCoordinator,
        store: Arc<MemRequestStore>,
        events: SessionEventReceiver,
        expiries: crate::events::ExpiryFiredReceiver,
    }

    fn harness(available: Vec<Uuid>) -> Harness {
        let store = Arc::new(MemRequestStore::new());
        let (expiry_tx, expiries) = expiry_fired_channel();
        let (event_tx, events) = session_event_channel();
        let coordinator = MatchingCoordinator::new(
            Arc::clone(&store) as Arc<dyn RequestStore>,
            Arc::new(StaticAvailabilityProbe::new(available)),
            ExpiryScheduler::new(expiry_tx),
            event_tx,
            ConfigStore::new(MatchingConfig::default()),
        );
        Harness {
            coordinator,
            store,
            events,
            expiries,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn accept_within_window_resolves_accepted() {
        let responder = Uuid::new_v4();
        let mut h = harness(vec![responder]);

        let request = h
            .coordinator
            .request(Uuid::new_v4(), responder, SessionKind::Voice)
            .await
            .unwrap();
        assert!(matches!(
            h.events.try_recv().unwrap(),
            SessionEvent::RequestCreated { .. }
        ));

        tokio::time::advance(Duration::from_secs(5)).await;
        let resolved = h.coordinator.respond(request.id, true).await.unwrap();
        assert_eq!(resolved.state, RequestState::Accepted);
        assert!(matches!(
            h.events.try_recv().unwrap(),
            SessionEvent::RequestResolved { .. }
        ));

        // The timer was disarmed; nothing fires after the window.
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(h.expiries.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn silence_expires_the_request_as_missed() {
        let responder = Uuid::new_v4();
        let mut h = harness(vec![responder]);

        let request = h
            .coordinator
            .request(Uuid::new_v4(), responder, SessionKind::Video)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        let fired = h.expiries.recv().await.unwrap();
        assert_eq!(fired.request_id, request.id);

        let missed = h.coordinator.expire(fired.request_id).await.unwrap();
        assert_eq!(missed.state, RequestState::Missed);
        assert_eq!(h.store.missed_interactions().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_loses_to_expiry() {
        let responder = Uuid::new_v4();
        let mut h = harness(vec![responder]);

        let request = h
            .coordinator
            .request(Uuid::new_v4(), responder, SessionKind::Chat)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        let fired = h.expiries.recv().await.unwrap();
        h.coordinator.expire(fired.request_id).await.unwrap();

        let err = h.coordinator.respond(request.id, true).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyResolved));
        assert_eq!(
            h.store.get(request.id).await.unwrap().state,
            RequestState::Missed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_loses_to_earlier_response() {
        let responder = Uuid::new_v4();
        let mut h = harness(vec![responder]);

        let request = h
            .coordinator
            .request(Uuid::new_v4(), responder, SessionKind::Voice)
            .await
            .unwrap();
        h.coordinator.respond(request.id, false).await.unwrap();

        // A stale expiry hint for the resolved request is a no-op.
        let err = h.coordinator.expire(request.id).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyResolved));
        assert_eq!(
            h.store.get(request.id).await.unwrap().state,
            RequestState::Rejected
        );
        assert!(h.store.missed_interactions().await.is_empty());
    }

    #[tokio::test]
    async fn unavailable_responder_is_refused() {
        let h = harness(vec![]);
        let err = h
            .coordinator
            .request(Uuid::new_v4(), Uuid::new_v4(), SessionKind::Voice)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ResponderUnavailable));
    }

    #[tokio::test]
    async fn duplicate_pending_pair_is_refused() {
        let responder = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let h = harness(vec![responder]);

        h.coordinator
            .request(requester, responder, SessionKind::Voice)
            .await
            .unwrap();
        let err = h
            .coordinator
            .request(requester, responder, SessionKind::Voice)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict));
    }
}
