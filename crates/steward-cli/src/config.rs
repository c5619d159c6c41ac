//! Layered configuration for the `steward` binary

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use steward_client::{Config, DEFAULT_ENDPOINT};
use steward_core::{ReconcilerConfig, RetryConfig};

/// Prefix of environment variables read by [`StewardConfig::load`]
pub const ENV_PREFIX: &str = "STEWARD";

/// Settings shared by every subcommand
///
/// Sources, lowest precedence first: built-in defaults, an optional TOML
/// file, `STEWARD_*` environment variables. Nested keys use `__` in the
/// environment, e.g. `STEWARD_RETRY__MAX_RETRIES`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StewardConfig {
    /// Storage API endpoint URL
    pub endpoint: String,
    /// Project that owns newly created buckets
    pub project: Option<String>,
    /// OAuth bearer token
    pub access_token: Option<String>,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
    /// Retry policy for remote calls
    pub retry: RetryConfig,
    /// Create-conflict cycles tolerated per reconciliation
    pub max_conflict_cycles: u32,
    /// Wall-clock bound per reconciliation (seconds, 0 = unbounded)
    pub deadline_secs: u64,
}

impl Default for StewardConfig {
    fn default() -> Self {
        let reconciler = ReconcilerConfig::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project: None,
            access_token: None,
            timeout_secs: 30,
            retry: reconciler.retry,
            max_conflict_cycles: reconciler.max_conflict_cycles,
            deadline_secs: reconciler.deadline.map(|d| d.as_secs()).unwrap_or_default(),
        }
    }
}

impl StewardConfig {
    /// Load from the optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with(path, environment())
    }

    /// Load from the optional file and the given environment source
    pub fn load_with(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder.add_source(env).build()?.try_deserialize()
    }

    /// Settings for the HTTP client
    pub fn client_config(&self) -> Config {
        let mut config = Config::new(&self.endpoint).with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(token) = &self.access_token {
            config = config.with_token(token);
        }
        if let Some(project) = &self.project {
            config = config.with_project(project);
        }
        config
    }

    /// Settings for the reconciler
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        let config = ReconcilerConfig::new(self.retry.clone()).with_max_conflict_cycles(self.max_conflict_cycles);
        match self.deadline_secs {
            0 => config.without_deadline(),
            secs => config.with_deadline(Duration::from_secs(secs)),
        }
    }
}

/// `STEWARD_*` environment source
pub fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
