//! Bounded retries for single remote calls

use crate::{store::StoreResult, LifecycleError, Operation, StoreError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Retry policy for transient store failures
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts allowed after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    #[serde(with = "millis")]
    pub base_delay: Duration,
    /// Upper bound for a single delay
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Retry up to `max_retries` times without waiting in between
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Set the retry count
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set exponential backoff bounds
    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay.max(base_delay);
        self
    }

    /// Delay before the given retry (1 = first retry)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let shift = retry.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

/// Why an executed call did not produce a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// The store reported a failure retrying cannot fix
    #[error(transparent)]
    Permanent(StoreError),

    /// Every allowed attempt failed transiently
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: StoreError },
}

impl RetryError {
    /// The last store failure observed
    pub fn store_error(&self) -> &StoreError {
        match self {
            Self::Permanent(e) => e,
            Self::Exhausted { last, .. } => last,
        }
    }

    /// Wrap into the caller-facing error with bucket and operation context
    pub fn into_lifecycle(self, bucket: &str, operation: Operation) -> LifecycleError {
        match self {
            Self::Permanent(source) => LifecycleError::Remote {
                bucket: bucket.to_string(),
                operation,
                source,
            },
            Self::Exhausted { attempts, last } => LifecycleError::RetriesExhausted {
                bucket: bucket.to_string(),
                operation,
                attempts,
                source: last,
            },
        }
    }
}

/// Runs remote calls under a [`RetryConfig`]
///
/// Only transient failures are retried. Not-found, conflict, forbidden and
/// malformed-request failures come back on the first attempt so callers can
/// branch on them.
#[derive(Clone, Debug, Default)]
pub struct RetryingExecutor {
    config: RetryConfig,
}

impl RetryingExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `call` until it succeeds, fails permanently, or the budget is spent
    pub async fn execute<T, F, Fut>(
        &self,
        operation: Operation,
        resource: &str,
        mut call: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match call().await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(%operation, resource, attempts, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_transient() => return Err(RetryError::Permanent(e)),
                Err(e) => {
                    if attempts > self.config.max_retries {
                        warn!(%operation, resource, attempts, error = %e, "retry budget exhausted");
                        return Err(RetryError::Exhausted { attempts, last: e });
                    }
                    let delay = self.config.delay_for_retry(attempts);
                    warn!(
                        %operation,
                        resource,
                        attempt = attempts,
                        error = %e,
                        ?delay,
                        "transient failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
