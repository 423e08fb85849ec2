//! Fixed-delay retry for workflow nodes.
//!
//! Every node that reaches an external capability runs under a
//! [`RetryPolicy`]: a fixed number of attempts, a fixed pause between them,
//! and an optional timeout on each attempt. There is no backoff curve and no
//! jitter. When the attempts run out the last error is handed back untouched.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Errors that the retry loop knows how to classify.
pub trait Retryable: Sized {
    /// Whether another attempt could plausibly succeed.
    fn is_retryable(&self) -> bool;

    /// Build the error reported when an attempt exceeds its timeout.
    fn timed_out(after: Duration) -> Self;
}

/// Retry policy attached to a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,

    /// Pause between two consecutive attempts.
    pub delay: Duration,

    /// Upper bound for a single attempt.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            attempt_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and delay.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay, ..Default::default() }
    }

    /// Run exactly once (nodes that never leave the process).
    pub fn none() -> Self {
        Self { max_attempts: 1, delay: Duration::ZERO, attempt_timeout: None }
    }

    /// Set the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Delay before the given attempt (1-based). The first attempt never waits.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.delay
        }
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error).
    pub result: Result<T, E>,

    /// Number of attempts made.
    pub attempts: u32,

    /// Total time spent (including delays).
    pub total_time: Duration,

    /// Whether the operation was retried.
    pub was_retried: bool,
}

impl<T, E> RetryResult<T, E> {
    /// Check if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Get the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Retry an async operation under the given policy.
///
/// `on_failure` is called with the attempt number and the error for every
/// failed attempt that will be followed by another one.
pub async fn retry_async<T, E, F, Fut, L>(
    policy: &RetryPolicy,
    mut operation: F,
    mut on_failure: L,
) -> RetryResult<T, E>
where
    E: Retryable,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    L: FnMut(u32, &E),
{
    let start = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        let delay = policy.delay_for_attempt(attempts);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = match policy.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, operation(attempts)).await {
                Ok(result) => result,
                Err(_) => Err(E::timed_out(limit)),
            },
            None => operation(attempts).await,
        };

        let give_up = match &result {
            Ok(_) => true,
            Err(e) => !e.is_retryable() || attempts >= max_attempts,
        };

        if give_up {
            return RetryResult {
                result,
                attempts,
                total_time: start.elapsed(),
                was_retried: attempts > 1,
            };
        }

        if let Err(ref e) = result {
            on_failure(attempts, e);
        }
    }
}
