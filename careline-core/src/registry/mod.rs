//! The connection request registry: persistence seam for the matching
//! state machine.
//!
//! Implementations must provide one guarantee above plain storage: a
//! request leaves `pending` exactly once, no matter how many accept,
//! reject, and expiry attempts race. Losers get
//! [`CoreError::AlreadyResolved`].
//!
//! [`CoreError::AlreadyResolved`]: crate::error::CoreError::AlreadyResolved

pub mod mem;
pub mod pg;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::connection_request::ConnectionRequest;
use crate::entities::{RequestState, SessionKind};
use crate::error::CoreResult;

pub use mem::MemRequestStore;
pub use pg::PgRequestStore;

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Create a new pending request. Fails with `Conflict` when the pair
    /// already has one pending.
    async fn create(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        kind: SessionKind,
    ) -> CoreResult<ConnectionRequest>;

    /// Move a pending request to `accepted` or `rejected`. Exactly one
    /// concurrent transition wins; the rest see `AlreadyResolved`.
    async fn transition(&self, id: Uuid, to: RequestState) -> CoreResult<ConnectionRequest>;

    /// Move a pending request to `missed` and record the missed
    /// interaction atomically.
    async fn transition_to_missed(&self, id: Uuid) -> CoreResult<ConnectionRequest>;

    async fn get(&self, id: Uuid) -> CoreResult<ConnectionRequest>;
}
