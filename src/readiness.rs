//! Bounded wait for an external resource to become usable.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessError {
    #[error("{resource} not ready after {attempts} attempts: {last_error}")]
    Exhausted {
        resource: String,
        attempts: u32,
        last_error: String,
    },
    #[error("wait for {resource} was cancelled")]
    Cancelled { resource: String },
}

/// Checks `resource` until it succeeds, sleeping with exponential backoff
/// between attempts. Flipping `cancel` to `true` aborts the wait at the next
/// attempt or sleep boundary.
pub async fn wait_until_ready<T, E, F, Fut>(
    resource: &str,
    cfg: ReadinessConfig,
    mut cancel: watch::Receiver<bool>,
    mut check: F,
) -> Result<T, ReadinessError>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = cfg.max_attempts.max(1);
    let cancelled = || ReadinessError::Cancelled {
        resource: resource.to_string(),
    };

    let mut attempt: u32 = 0;
    loop {
        let stop = *cancel.borrow();
        if stop {
            warn!(component = "readiness", event = "backend.readiness.cancelled", resource, attempt);
            return Err(cancelled());
        }

        attempt += 1;
        let err = match check().await {
            Ok(value) => {
                info!(component = "readiness", event = "backend.readiness.ok", resource, attempt);
                return Ok(value);
            }
            Err(err) => err.to_string(),
        };

        if attempt >= max_attempts {
            warn!(
                component = "readiness",
                event = "backend.readiness.exhausted",
                resource,
                attempts = attempt,
                error = %err
            );
            return Err(ReadinessError::Exhausted {
                resource: resource.to_string(),
                attempts: attempt,
                last_error: err,
            });
        }

        let shift = (attempt - 1).min(10);
        let sleep_ms = cfg.initial_delay_ms.saturating_mul(1u64 << shift);
        warn!(
            component = "readiness",
            event = "backend.readiness.retry",
            resource,
            attempt,
            sleep_ms,
            error = %err
        );

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(sleep_ms)) => {}
            changed = cancel.changed() => {
                // A dropped sender can no longer cancel; keep waiting out the delay.
                if changed.is_err() {
                    tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> ReadinessConfig {
        ReadinessConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let (_tx, rx) = watch::channel(false);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = wait_until_ready("backend", fast(), rx, move || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("attempt {n} refused"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reports_exhaustion_with_last_error() {
        let (_tx, rx) = watch::channel(false);
        let result: Result<(), _> =
            wait_until_ready("backend", fast(), rx, || async { Err("connection refused") }).await;

        assert_eq!(
            result,
            Err(ReadinessError::Exhausted {
                resource: "backend".to_string(),
                attempts: 3,
                last_error: "connection refused".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn cancellation_stops_before_next_attempt() {
        let (tx, rx) = watch::channel(false);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let cfg = ReadinessConfig {
            max_attempts: 10,
            initial_delay_ms: 60_000,
        };

        let waiter = tokio::spawn(async move {
            wait_until_ready("map tiles", cfg, rx, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("not yet") }
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ReadinessError::Cancelled { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_checks_once() {
        let (_tx, rx) = watch::channel(false);
        let cfg = ReadinessConfig {
            max_attempts: 0,
            initial_delay_ms: 1,
        };
        let result = wait_until_ready("backend", cfg, rx, || async { Ok::<_, String>("up") }).await;
        assert_eq!(result, Ok("up"));
    }
}
