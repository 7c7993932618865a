//! Bounded retry with exponential backoff and jitter

use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// How transient provider failures are retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f32,
    /// Relative jitter in `[0, 1]` applied to each delay
    pub jitter: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Computes exponential backoff with optional jitter.
pub struct BackoffCalculator;

impl BackoffCalculator {
    /// Delay after the given 0-based attempt
    pub fn delay(policy: &RetryPolicy, attempt: u32) -> Duration {
        let pow = policy.multiplier.max(1.0).powi(attempt as i32);
        let max_ms = policy.max_backoff.as_millis() as u64;
        let delay_ms = ((policy.initial_backoff.as_millis() as f32 * pow) as u64).min(max_ms);

        let jitter = policy.jitter.clamp(0.0, 1.0);
        if jitter > 0.0 {
            let mut rng = rand::rng();
            let scale: f32 = rng.random_range(-jitter..=jitter);
            let jitter_ms = (delay_ms as f32 * scale).round() as i64;
            let adjusted = (delay_ms as i64 + jitter_ms).max(0) as u64;
            return Duration::from_millis(adjusted);
        }

        Duration::from_millis(delay_ms)
    }
}

/// Runs an async operation until it succeeds, hits a non-retryable error,
/// or exhausts the policy.
pub struct RetryExecutor;

impl RetryExecutor {
    /// Returns the final output and the number of attempts made.
    ///
    /// - `operation(attempt)`: perform one attempt (0-based)
    /// - `should_retry(&output)`: true to try again
    pub async fn run<Op, Fut, T, ShouldRetry>(
        policy: &RetryPolicy,
        mut operation: Op,
        should_retry: ShouldRetry,
    ) -> (T, u32)
    where
        Op: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = T>,
        ShouldRetry: Fn(&T) -> bool,
    {
        let max = policy.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let output = operation(attempt).await;
            let attempts = attempt + 1;

            if !should_retry(&output) || attempts >= max {
                return (output, attempts);
            }

            let delay = BackoffCalculator::delay(policy, attempt);
            debug!(
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                "Retry backoff"
            );
            tokio::time::sleep(delay).await;
            attempt = attempts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(jitter: f32) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
            multiplier: 2.0,
            jitter,
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let p = policy(0.0);
        assert_eq!(BackoffCalculator::delay(&p, 0), Duration::from_millis(100));
        assert_eq!(BackoffCalculator::delay(&p, 1), Duration::from_millis(200));
        assert_eq!(BackoffCalculator::delay(&p, 2), Duration::from_millis(350));
        assert_eq!(BackoffCalculator::delay(&p, 9), Duration::from_millis(350));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let p = policy(0.5);
        for _ in 0..100 {
            let d = BackoffCalculator::delay(&p, 0).as_millis();
            assert!((50..=150).contains(&d), "delay {} out of bounds", d);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let (output, attempts) = RetryExecutor::run(
            &policy(0.0),
            move |attempt| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 { Err("transient") } else { Ok("done") }
                }
            },
            |r: &Result<&str, &str>| r.is_err(),
        )
        .await;

        assert_eq!(output, Ok("done"));
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_max_attempts() {
        let (output, attempts) = RetryExecutor::run(
            &policy(0.0),
            |_| async { Err::<(), _>("always") },
            |r| r.is_err(),
        )
        .await;
        assert!(output.is_err());
        assert_eq!(attempts, 4);
    }

    #[tokio::test]
    async fn test_no_retry_when_not_requested() {
        let (_, attempts) =
            RetryExecutor::run(&policy(0.0), |_| async { Err::<(), _>("permanent") }, |_| false)
                .await;
        assert_eq!(attempts, 1);
    }
}
