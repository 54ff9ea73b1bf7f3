// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Retry policy and the retry loop wrapped around a node's execute phase.
//!
//! A [`RetryPolicy`] counts total attempts, so `max_attempts = 3` means one call
//! plus at most two retries. Between attempts the loop waits
//! `wait * backoff_factor^(retry - 1)`, capped at `max_wait`. With the default
//! factor of `1.0` that is a fixed delay.
//!
//! The loop stops early, without consuming the remaining attempts, when:
//! - the node returns [`NodeError::Cancelled`], or
//! - the run's cancellation token fires (checked before every attempt and
//!   raced against the backoff sleep).

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::consts::{DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS};
use crate::errors::NodeError;
use crate::observability::messages::node::{ExecuteAttemptFailed, RetryAbandoned, RetryScheduled};
use crate::observability::messages::StructuredLog;

/// How often, and how patiently, a node's execute phase is attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first; never less than 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub wait: Duration,
    /// Multiplier applied to the delay after every retry; `1.0` keeps it fixed.
    pub backoff_factor: f64,
    /// Upper bound on any single delay.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    /// A single attempt and no delay: failures go straight to the fallback.
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wait: Duration::ZERO,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_wait: Duration::MAX,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Values below `1.0` are clamped to `1.0`; delays never shrink.
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = if factor.is_finite() { factor.max(1.0) } else { 1.0 };
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts.max(1)
    }

    /// Delay to wait after `attempts_made` failed attempts, before the next one.
    pub fn delay_after(&self, attempts_made: u32) -> Duration {
        if self.wait.is_zero() || attempts_made == 0 {
            return Duration::ZERO;
        }
        let exponent = attempts_made.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.wait.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = scaled.min(self.max_wait.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_wait)
    }
}

/// Drive `attempt` under `policy`. Returns the final result and how many attempts ran.
pub(crate) async fn execute_with_retry<T, F, Fut>(
    node_id: &str,
    policy: &RetryPolicy,
    cancellation: &CancellationToken,
    mut attempt: F,
) -> (Result<T, NodeError>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NodeError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        if cancellation.is_cancelled() {
            RetryAbandoned { node_id, attempts }.log();
            return (Err(NodeError::Cancelled), attempts);
        }

        attempts += 1;
        let error = match attempt().await {
            Ok(value) => return (Ok(value), attempts),
            Err(error) if error.is_cancelled() => return (Err(error), attempts),
            Err(error) => error,
        };

        ExecuteAttemptFailed {
            node_id,
            attempt: attempts,
            max_attempts,
            error: &error,
        }
        .log();

        if !policy.should_retry(attempts) {
            return (Err(error), attempts);
        }

        let delay = policy.delay_after(attempts);
        if !delay.is_zero() {
            RetryScheduled {
                node_id,
                next_attempt: attempts + 1,
                delay,
            }
            .log();

            tokio::select! {
                _ = cancellation.cancelled() => {
                    RetryAbandoned { node_id, attempts }.log();
                    return (Err(NodeError::Cancelled), attempts);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_policy_is_single_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 1);
        assert!(policy.should_retry(0));
        assert!(!policy.should_retry(1));
        assert_eq!(policy.delay_after(1), Duration::ZERO);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let policy = RetryPolicy::new(5)
            .with_wait(Duration::from_millis(100))
            .with_backoff_factor(2.0)
            .with_max_wait(Duration::from_millis(300));

        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(300));
        assert_eq!(policy.delay_after(4), Duration::from_millis(300));
    }

    #[test]
    fn test_backoff_factor_below_one_is_clamped() {
        let policy = RetryPolicy::new(3)
            .with_wait(Duration::from_millis(50))
            .with_backoff_factor(0.1);
        assert_eq!(policy.delay_after(3), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_always_failing_makes_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let policy = RetryPolicy::new(4);

        let (result, attempts) =
            execute_with_retry::<(), _, _>("flaky", &policy, &CancellationToken::new(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NodeError::failed("nope"))
            })
            .await;

        assert!(matches!(result, Err(NodeError::Failed(ref m)) if m == "nope"));
        assert_eq!(attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_succeeds_on_later_attempt() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let policy = RetryPolicy::new(3);

        let (result, attempts) =
            execute_with_retry("eventually", &policy, &CancellationToken::new(), move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(NodeError::failed("not yet"))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.ok(), Some("done"));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_cancelled_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let policy = RetryPolicy::new(5);

        let (result, attempts) =
            execute_with_retry::<(), _, _>("cancel", &policy, &CancellationToken::new(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NodeError::Cancelled)
            })
            .await;

        assert!(matches!(result, Err(NodeError::Cancelled)));
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let policy = RetryPolicy::new(3).with_wait(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let (result, attempts) =
            execute_with_retry::<(), _, _>("slow", &policy, &CancellationToken::new(), move || async move {
                Err(NodeError::failed("down"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let policy = RetryPolicy::new(10).with_wait(Duration::from_secs(60));
        let token = CancellationToken::new();
        let canceller = token.clone();
        let calls = AtomicU32::new(0);
        let calls = &calls;

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            canceller.cancel();
        });

        let (result, attempts) = execute_with_retry::<(), _, _>("stuck", &policy, &token, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(NodeError::failed("unavailable"))
        })
        .await;

        assert!(matches!(result, Err(NodeError::Cancelled)));
        assert_eq!(attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_already_cancelled_never_attempts() {
        let token = CancellationToken::new();
        token.cancel();

        let (result, attempts) =
            execute_with_retry::<(), _, _>("late", &RetryPolicy::new(3), &token, move || async move {
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(NodeError::Cancelled)));
        assert_eq!(attempts, 0);
    }
}
