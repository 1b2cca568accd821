//! Bounded retry loop over an attemptable unit of work.

use anyhow::{Error, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::time::Duration;

/// Default number of attempts, including the first one.
pub const MAX_ATTEMPTS: usize = 3;

/// Default delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Result of a single attempt: whether another attempt should be made, and
/// the error observed (if any).
#[derive(Debug)]
pub struct AttemptOutcome {
    pub should_retry: bool,
    pub error: Option<Error>,
}

impl AttemptOutcome {
    /// The attempt succeeded; stop.
    pub fn done() -> Self {
        Self {
            should_retry: false,
            error: None,
        }
    }

    /// The attempt failed in a way that another attempt won't fix.
    pub fn fail(error: Error) -> Self {
        Self {
            should_retry: false,
            error: Some(error),
        }
    }

    /// The attempt failed transiently.
    pub fn retry(error: Option<Error>) -> Self {
        Self {
            should_retry: true,
            error,
        }
    }
}

/// One attemptable unit of work. Implementations keep whatever state they
/// need to expose the last result once the strategy returns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Retryable: Send {
    async fn attempt(&mut self) -> AttemptOutcome;
}

/// Retry settings as they appear in a caller's configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            retry_delay_ms: RETRY_DELAY_MS,
        }
    }
}

impl RetryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Calls a [`Retryable`] up to `max_attempts` times, sleeping `delay`
/// between attempts. Built per operation and discarded afterwards.
pub struct AttemptRetryStrategy<'a, R: Retryable + ?Sized> {
    max_attempts: usize,
    delay: Duration,
    retryable: &'a mut R,
}

impl<'a, R: Retryable + ?Sized> AttemptRetryStrategy<'a, R> {
    /// A `max_attempts` of zero is treated as one: the first attempt always happens.
    pub fn new(max_attempts: usize, delay: Duration, retryable: &'a mut R) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retryable,
        }
    }

    /// Runs attempts until the retryable asks to stop or the budget is spent.
    ///
    /// Returns the error of the final attempt, or `Ok(())` if that attempt
    /// reported none.
    #[tracing::instrument(skip(self))]
    pub async fn run(&mut self) -> Result<()> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            debug!("Making attempt #{}/{}", attempt, self.max_attempts);

            let outcome = self.retryable.attempt().await;
            if !outcome.should_retry {
                return match outcome.error {
                    Some(e) => {
                        debug!("Attempt #{} failed, not retrying: {:#}", attempt, e);
                        Err(e)
                    }
                    None => Ok(()),
                };
            }

            if attempt < self.max_attempts {
                match &outcome.error {
                    Some(e) => warn!(
                        "Attempt {}/{} failed ({:#}), retrying in {:?}...",
                        attempt, self.max_attempts, e, self.delay
                    ),
                    None => warn!(
                        "Attempt {}/{} asked for a retry, retrying in {:?}...",
                        attempt, self.max_attempts, self.delay
                    ),
                }
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
            }
            last_error = outcome.error;
        }

        debug!("Giving up after {} attempts", self.max_attempts);
        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
