//! Bounded retry for transient store-write failures.
//!
//! Transient conditions (connection drops, pool timeouts) are retried with
//! exponential backoff; everything else — constraint violations, bad SQL,
//! missing rows — is returned immediately because retrying cannot fix it.

use std::future::Future;
use std::time::Duration;

use crate::DbError;

/// Returns `true` for errors worth retrying after a backoff delay.
///
/// Retriable: I/O-level failures and pool exhaustion.
/// Not retriable: database-reported errors (constraint violations, type
/// mismatches), `NotFound`, migration errors, missing configuration.
fn is_retriable(err: &DbError) -> bool {
    match err {
        DbError::Sqlx(e) => matches!(
            e,
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
        ),
        DbError::MissingDatabaseUrl | DbError::NotFound | DbError::Migration(_) => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// Backoff sleeps `backoff_base_ms * 2^attempt` milliseconds, capped at
/// 30 s. With `max_retries = 3` the operation runs at most 4 times total.
/// Non-retriable errors are returned immediately.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retriable error encountered.
pub async fn retry_write<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay_ms = backoff_base_ms
                    .saturating_mul(1u64 << attempt.min(10))
                    .min(MAX_DELAY_MS);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient store error — retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn io_error() -> DbError {
        DbError::Sqlx(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        )))
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&DbError::NotFound));
    }

    #[test]
    fn io_error_is_retriable() {
        assert!(is_retriable(&io_error()));
    }

    #[test]
    fn pool_timeout_is_retriable() {
        assert!(is_retriable(&DbError::Sqlx(sqlx::Error::PoolTimedOut)));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_write(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, DbError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_error_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_write(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(io_error())
                } else {
                    Ok::<u32, DbError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retries_and_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_write(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, DbError>(io_error())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(DbError::Sqlx(_))));
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_write(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, DbError>(DbError::NotFound)
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(DbError::NotFound)));
    }
}
