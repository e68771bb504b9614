//! Error types for the matching and ledger core.
//!
//! State-machine races (`AlreadyResolved`) are expected outcomes, not
//! failures: they are surfaced to the caller as a typed result and never
//! logged at error level. Only `Store` errors can be transient; idempotent
//! reads may retry them with [`retry_read`], financial mutations must not.

use std::time::Duration;

/// Errors produced by the matching and ledger core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The responder already has a pending request from this requester.
    #[error("a pending request between these actors already exists")]
    Conflict,

    /// The request or withdrawal reached a terminal state before this
    /// operation could apply; the caller lost the race.
    #[error("already resolved")]
    AlreadyResolved,

    /// The responder is offline or busy; nothing was persisted.
    #[error("responder is not available")]
    ResponderUnavailable,

    /// The wallet balance does not cover the requested amount.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// A monetary amount was zero or negative.
    #[error("amount must be positive")]
    InvalidAmount,

    /// The referenced request, wallet, or withdrawal does not exist.
    #[error("not found")]
    NotFound,

    /// The backing transactional store failed.
    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether the error is a transient store failure worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::Store(
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

/// Bounded retry attempts for idempotent reads.
const READ_RETRY_ATTEMPTS: u32 = 3;

/// Run an idempotent read, retrying transient store failures with a short
/// exponential backoff. Never use this for mutations: a financial write
/// must not be replayed without first checking whether it committed.
pub async fn retry_read<T, F, Fut>(mut op: F) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt + 1 < READ_RETRY_ATTEMPTS => {
                attempt += 1;
                tracing::debug!(attempt, error = %err, "retrying idempotent read");
                tokio::time::sleep(Duration::from_millis(50 * 2u64.pow(attempt))).await;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retry_read_recovers_from_transient_failure() {
        let calls = AtomicU32::new(0);
        let result: CoreResult<u32> = retry_read(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(CoreError::Store(sqlx::Error::PoolTimedOut))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_read_gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let result: CoreResult<u32> = retry_read(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CoreError::Store(sqlx::Error::PoolTimedOut)) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), READ_RETRY_ATTEMPTS);
    }

    #[tokio::test]
    async fn retry_read_does_not_retry_terminal_errors() {
        let calls = AtomicU32::new(0);
        let result: CoreResult<u32> = retry_read(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CoreError::NotFound) }
        })
        .await;
        assert!(matches!(result, Err(CoreError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
