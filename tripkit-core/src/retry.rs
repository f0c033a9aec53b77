use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, Retryable};

use crate::config::RetryConfig;

/// Bounded retry with linear backoff for calls to the remote relay.
///
/// Between attempt `n` and `n + 1` the policy waits `base_delay * n`. Errors
/// the classifier rejects abort immediately; when every attempt fails with a
/// retryable error the last one is returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }
}

impl RetryPolicy {
    /// Creates a policy making at most `max_attempts` calls. Zero is treated as one.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
        }
    }

    /// Total number of calls the policy allows.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay unit of the linear schedule.
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// The backoff schedule this policy sleeps through.
    #[must_use]
    pub const fn backoff(&self) -> LinearBuilder {
        LinearBuilder {
            base_delay: self.base_delay,
            max_times: self.max_attempts - 1,
        }
    }

    /// Runs `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the terminal error unchanged, or the last retryable error once
    /// the budget is exhausted.
    pub async fn run<T, E, Fut, F, R>(&self, operation: F, is_retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnMut(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1u32;
        let max_attempts = self.max_attempts;
        operation
            .retry(self.backoff())
            .when(is_retryable)
            .notify(|err: &E, delay: Duration| {
                log::warn!(
                    "attempt {attempt}/{max_attempts} failed: {err}; retrying in {}ms",
                    delay.as_millis()
                );
                attempt += 1;
            })
            .await
    }
}

/// Builds a [`LinearBackoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBuilder {
    base_delay: Duration,
    max_times: u32,
}

impl BackoffBuilder for LinearBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            base_delay: self.base_delay,
            step: 0,
            max_times: self.max_times,
        }
    }
}

/// Yields `base, 2 * base, 3 * base, ...` for a bounded number of retries.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_delay: Duration,
    step: u32,
    max_times: u32,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.max_times {
            return None;
        }
        self.step += 1;
        Some(self.base_delay.saturating_mul(self.step))
    }
}
