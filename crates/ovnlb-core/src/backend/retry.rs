// ── Retry on row-not-found ──
//
// Rows created by a transaction that is still in flight are briefly
// invisible. Only that case is retried, immediately and a bounded number
// of times; every other outcome is returned as-is.

use std::future::Future;

use tracing::debug;

use super::BackendError;

/// Run `op` up to `attempts` times while it fails with `RowNotFound`.
///
/// The last `RowNotFound` is returned once attempts are exhausted.
pub async fn retry_on_not_found<T, F, Fut>(attempts: u32, mut op: F) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_row_not_found() && attempt < attempts => {
                debug!(attempt, attempts, error = %err, "row not visible yet, retrying");
                attempt += 1;
                tokio::task::yield_now().await;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn not_found() -> BackendError {
        BackendError::lb_not_found("lb1")
    }

    #[tokio::test]
    async fn succeeds_after_transient_misses() {
        let calls = AtomicU32::new(0);
        let result = retry_on_not_found(3, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(not_found())
            } else {
                Ok("row")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "row");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_on_not_found(3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(not_found())
        })
        .await;

        assert!(result.unwrap_err().is_row_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_on_not_found(5, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Unavailable {
                message: "connection reset".into(),
            })
        })
        .await;

        assert!(matches!(result, Err(BackendError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let _ = retry_on_not_found(0, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(not_found())
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
