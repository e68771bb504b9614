use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entities::connection_request::ConnectionRequest;
use crate::entities::missed_interaction::MissedInteraction;
use crate::entities::{RequestState, SessionKind, now_primitive};
use crate::error::{CoreError, CoreResult};
use crate::registry::RequestStore;

/// In-memory request registry for tests and embedded use. A single mutex
/// stands in for the database's row-level atomicity, which preserves the
/// exactly-one-winner transition semantics.
#[derive(Default)]
pub struct MemRequestStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    requests: HashMap<Uuid, ConnectionRequest>,
    missed: Vec<MissedInteraction>,
    next_missed_id: i64,
}

impl MemRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missed interaction rows recorded so far, for assertions.
    pub async fn missed_interactions(&self) -> Vec<MissedInteraction> {
        self.inner.lock().await.missed.clone()
    }
}

#[async_trait]
impl RequestStore for MemRequestStore {
    async fn create(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        kind: SessionKind,
    ) -> CoreResult<ConnectionRequest> {
        let mut inner = self.inner.lock().await;
        let duplicate = inner.requests.values().any(|r| {
            r.requester_id == requester_id
                && r.responder_id == responder_id
                && r.state == RequestState::Pending
        });
        if duplicate {
            return Err(CoreError::Conflict);
        }
        let request = ConnectionRequest {
            id: Uuid::new_v4(),
            requester_id,
            responder_id,
            kind,
            state: RequestState::Pending,
            created_at: now_primitive(),
        };
        inner.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn transition(&self, id: Uuid, to: RequestState) -> CoreResult<ConnectionRequest> {
        let mut inner = self.inner.lock().await;
        let request = inner.requests.get_mut(&id).ok_or(CoreError::NotFound)?;
        if request.state != RequestState::Pending {
            return Err(CoreError::AlreadyResolved);
        }
        request.state = to;
        Ok(request.clone())
    }

    async fn transition_to_missed(&self, id: Uuid) -> CoreResult<ConnectionRequest> {
        let mut inner = self.inner.lock().await;
        let request = inner.requests.get_mut(&id).ok_or(CoreError::NotFound)?;
        if request.state != RequestState::Pending {
            return Err(CoreError::AlreadyResolved);
        }
        request.state = RequestState::Missed;
        let request = request.clone();
        inner.next_missed_id += 1;
        let missed = MissedInteraction {
            id: inner.next_missed_id,
            request_id: request.id,
            requester_id: request.requester_id,
            responder_id: request.responder_id,
            kind: request.kind,
            created_at: now_primitive(),
        };
        inner.missed.push(missed);
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> CoreResult<ConnectionRequest> {
        self.inner
            .lock()
            .await
            .requests
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn second_pending_request_for_pair_conflicts() {
        let store = MemRequestStore::new();
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .create(requester, responder, SessionKind::Voice)
            .await
            .unwrap();
        let err = store
            .create(requester, responder, SessionKind::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict));
    }

    #[tokio::test]
    async fn pair_can_reconnect_after_resolution() {
        let store = MemRequestStore::new();
        let (requester, responder) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store
            .create(requester, responder, SessionKind::Voice)
            .await
            .unwrap();
        store
            .transition(first.id, RequestState::Rejected)
            .await
            .unwrap();
        assert!(
            store
                .create(requester, responder, SessionKind::Voice)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn second_transition_loses() {
        let store = MemRequestStore::new();
        let request = store
            .create(Uuid::new_v4(), Uuid::new_v4(), SessionKind::Chat)
            .await
            .unwrap();

        store
            .transition(request.id, RequestState::Accepted)
            .await
            .unwrap();
        let err = store
            .transition(request.id, RequestState::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyResolved));

        // The losing transition did not disturb the stored state.
        let stored = store.get(request.id).await.unwrap();
        assert_eq!(stored.state, RequestState::Accepted);
    }

    #[tokio::test]
    async fn concurrent_transitions_have_exactly_one_winner() {
        let store = Arc::new(MemRequestStore::new());
        let request = store
            .create(Uuid::new_v4(), Uuid::new_v4(), SessionKind::Voice)
            .await
            .unwrap();

        let accept = tokio::spawn({
            let store = Arc::clone(&store);
            let id = request.id;
            async move { store.transition(id, RequestState::Accepted).await }
        });
        let expire = tokio::spawn({
            let store = Arc::clone(&store);
            let id = request.id;
            async move { store.transition_to_missed(id).await }
        });

        let outcomes = [accept.await.unwrap(), expire.await.unwrap()];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(
            outcomes
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, CoreError::AlreadyResolved))
        );
    }

    #[tokio::test]
    async fn missed_transition_records_interaction() {
        let store = MemRequestStore::new();
        let request = store
            .create(Uuid::new_v4(), Uuid::new_v4(), SessionKind::Video)
            .await
            .unwrap();

        store.transition_to_missed(request.id).await.unwrap();

        let missed = store.missed_interactions().await;
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].request_id, request.id);
        assert_eq!(missed[0].responder_id, request.responder_id);
    }
}
