//! Client configuration

use std::time::Duration;

/// Default storage API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Storage API endpoint URL
    pub endpoint: String,
    /// OAuth bearer token
    pub access_token: Option<String>,
    /// Project that owns newly created buckets
    pub project: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            project: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("bucket-steward/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new config with the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the owning project
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint without a trailing slash
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
