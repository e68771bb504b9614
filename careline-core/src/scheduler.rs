//! Per-request expiry timers.
//!
//! Each pending request gets one spawned sleep task. When the response
//! window elapses the task emits [`ExpiryFired`] and the expiry watcher
//! drives the actual state transition against the store; firing is only a
//! hint, the conditional update decides. Disarming aborts the task, but a
//! timer that slips through (abort racing the send) is harmless for the
//! same reason.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::events::{ExpiryFired, ExpiryFiredSender};

#[derive(Clone)]
pub struct ExpiryScheduler {
    fired_tx: ExpiryFiredSender,
    tasks: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl ExpiryScheduler {
    pub fn new(fired_tx: ExpiryFiredSender) -> Self {
        Self {
            fired_tx,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start the expiry timer for a request. Re-arming an already armed
    /// request replaces the old timer.
    pub async fn arm(&self, request_id: Uuid, after: Duration) {
        let fired_tx = self.fired_tx.clone();
        let tasks = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if fired_tx.send(ExpiryFired { request_id }).await.is_err() {
                tracing::warn!(%request_id, "expiry channel closed, timer dropped");
            }
            tasks.lock().await.remove(&request_id);
        });
        if let Some(previous) = self.tasks.lock().await.insert(request_id, handle) {
            previous.abort();
        }
    }

    /// Cancel the timer after the request resolved. Missing timers are
    /// fine: the request may have been resolved by the timer itself.
    pub async fn disarm(&self, request_id: Uuid) {
        if let Some(handle) = self.tasks.lock().await.remove(&request_id) {
            handle.abort();
        }
    }

    /// Number of currently armed timers.
    pub async fn armed(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::expiry_fired_channel;

    #[tokio::test(start_paused = true)]
    async fn armed_timer_fires_after_the_window() {
        let (tx, mut rx) = expiry_fired_channel();
        let scheduler = ExpiryScheduler::new(tx);
        let request_id = Uuid::new_v4();

        scheduler.arm(request_id, Duration::from_secs(30)).await;
        assert_eq!(scheduler.armed().await, 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.request_id, request_id);

        // The task cleans itself up once fired.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(scheduler.armed().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_timer_never_fires() {
        let (tx, mut rx) = expiry_fired_channel();
        let scheduler = ExpiryScheduler::new(tx);
        let request_id = Uuid::new_v4();

        scheduler.arm(request_id, Duration::from_secs(30)).await;
        scheduler.disarm(request_id).await;
        assert_eq!(scheduler.armed().await, 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_old_timer() {
        let (tx, mut rx) = expiry_fired_channel();
        let scheduler = ExpiryScheduler::new(tx);
        let request_id = Uuid::new_v4();

        scheduler.arm(request_id, Duration::from_secs(10)).await;
        scheduler.arm(request_id, Duration::from_secs(60)).await;
        assert_eq!(scheduler.armed().await, 1);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(rx.recv().await.is_some());
    }
}
