use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Reusable retry policy for upstream calls: bounded attempts with
/// exponential backoff, retrying only errors the caller classifies as
/// retryable. The default schedule is 1s, 2s, 4s across 3 attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, E, F, Fut, R>(&self, is_retryable: R, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut delay = self.base_delay;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !is_retryable(&err) || attempt >= self.max_attempts {
                        return Err(err);
                    }
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "upstream call rate limited, retrying: {err}"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= self.backoff_multiplier;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Retryable(bool);

    impl std::fmt::Display for Retryable {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "retryable={}", self.0)
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            backoff_multiplier: 2,
        }
    }

    #[tokio::test]
    async fn retries_exactly_max_attempts_when_always_retryable() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Retryable> = fast_policy()
            .run(
                |e: &Retryable| e.0,
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(Retryable(true)) }
                },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_propagates_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Retryable> = fast_policy()
            .run(
                |e: &Retryable| e.0,
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(Retryable(false)) }
                },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backoff_delays_follow_exponential_schedule() {
        let calls = AtomicU32::new(0);
        let start = std::time::Instant::now();
        let result: Result<(), Retryable> = fast_policy()
            .run(
                |e: &Retryable| e.0,
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(Retryable(true)) }
                },
            )
            .await;
        assert!(result.is_err());
        // Two sleeps: 10ms then 20ms.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(30), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(300), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn success_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, Retryable> = fast_policy()
            .run(
                |e: &Retryable| e.0,
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(Retryable(true))
                        } else {
                            Ok(7)
                        }
                    }
                },
            )
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
