//! Bounded retry with jittered exponential backoff.
//!
//! The resilient-provider circuit breaker in the teacher's agent layer
//! wraps a primary/fallback pair with a failure-threshold state machine;
//! there is no fallback backend here, only a single HTTP endpoint per
//! phase, so this module keeps just the bounded-retry half of that
//! idea: classify the error, retry transient ones with backoff, give up
//! immediately on permanent ones (§7 error table).

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{IngestError, Result};

/// Retry an async operation up to `attempts` times total (the first
/// call plus `attempts - 1` retries), backing off between attempts.
///
/// Delay before attempt `n` (1-indexed, n ≥ 2) is
/// `base_delay * 2^(n-2)`, jittered by ±25%. Only `IngestError::is_retryable`
/// errors are retried; any other error returns immediately.
pub async fn retry<T, F, Fut>(attempts: u32, base_delay: Duration, endpoint: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if attempt < attempts {
                    let delay = jittered_delay(base_delay, attempt);
                    warn!(
                        endpoint,
                        attempt,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient error, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(err);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| IngestError::Internal("retry loop exited without an error".into())))
}

fn jittered_delay(base_delay: Duration, attempt: u32) -> Duration {
    let exp = 2u32.saturating_pow(attempt.saturating_sub(1));
    let nominal = base_delay.saturating_mul(exp);
    let jitter_frac = fastrand::f64() * 0.5 - 0.25; // ±25%
    let jittered_ms = (nominal.as_millis() as f64) * (1.0 + jitter_frac);
    Duration::from_millis(jittered_ms.max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry(3, Duration::from_millis(1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result.expect("should succeed"), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry(3, Duration::from_millis(1), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(IngestError::transient("test", "temporary"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.expect("should eventually succeed"), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry(3, Duration::from_millis(1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(IngestError::transient("test", "still down")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_do_not_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry(3, Duration::from_millis(1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(IngestError::permanent("test", "not found")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
