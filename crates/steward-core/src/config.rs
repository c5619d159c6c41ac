//! Reconciler configuration

use crate::retry::RetryConfig;
use std::time::Duration;

/// Configuration for [`crate::BucketReconciler`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Retry policy applied to every remote call
    pub retry: RetryConfig,
    /// How many create-conflict-reread cycles to tolerate
    pub max_conflict_cycles: u32,
    /// Wall-clock bound for one reconciliation (None = unbounded)
    pub deadline: Option<Duration>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            max_conflict_cycles: 3,
            deadline: Some(Duration::from_secs(5 * 60)),
        }
    }
}

impl ReconcilerConfig {
    /// Create a config with the given retry policy
    pub fn new(retry: RetryConfig) -> Self {
        Self {
            retry,
            ..Default::default()
        }
    }

    /// Set the conflict cycle bound
    pub fn with_max_conflict_cycles(mut self, cycles: u32) -> Self {
        self.max_conflict_cycles = cycles;
        self
    }

    /// Set the per-invocation deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Remove the per-invocation deadline
    pub fn without_deadline(mut self) -> Self {
        self.deadline = None;
        self
    }
}
