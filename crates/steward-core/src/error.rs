//! Error types for the steward-core crate

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `LifecycleError`
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Remote operation a failure is attributed to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Insert,
    Update,
    Delete,
    Upload,
    Download,
}

impl Operation {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a store failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The bucket or object does not exist
    NotFound,
    /// Another actor already holds the name
    Conflict,
    /// Credentials rejected or insufficient
    Forbidden,
    /// The request itself was malformed
    InvalidRequest,
    /// Worth retrying: network blips, timeouts, 5xx
    Transient,
}

/// Failures raised by an object store for a single remote call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Bucket or object not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Access denied
    #[error("access denied: {0}")]
    Forbidden(String),

    /// Request rejected as malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Server-side failure or throttling
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Connection, timeout or other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Classify this failure
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Conflict(_) => FailureKind::Conflict,
            Self::Forbidden(_) => FailureKind::Forbidden,
            Self::InvalidRequest(_) | Self::Decode(_) => FailureKind::InvalidRequest,
            Self::Server { .. } | Self::Transport(_) => FailureKind::Transient,
        }
    }

    /// Check if retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.kind() == FailureKind::NotFound
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        self.kind() == FailureKind::Conflict
    }
}

/// Terminal failures surfaced to the caller of a lifecycle or transfer operation
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The bucket or object URI could not be used
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    /// The decorator produced a configuration the store would reject
    #[error("invalid desired state for bucket {bucket}: {reason}")]
    InvalidDesiredState { bucket: String, reason: String },

    /// A remote call failed permanently
    #[error("failed to {operation} bucket {bucket}: {source}")]
    Remote {
        bucket: String,
        operation: Operation,
        #[source]
        source: StoreError,
    },

    /// A remote call kept failing transiently until the retry budget ran out
    #[error("failed to {operation} bucket {bucket} after {attempts} attempts: {source}")]
    RetriesExhausted {
        bucket: String,
        operation: Operation,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// Bucket creation kept racing with another creator
    #[error("bucket {bucket} still conflicting after {cycles} create attempts")]
    ConflictLoopExhausted { bucket: String, cycles: u32 },

    /// Reconciliation did not finish within the configured deadline
    #[error("reconciliation of bucket {bucket} exceeded {limit:?}")]
    DeadlineExceeded { bucket: String, limit: Duration },

    /// Local path could not be mapped to or from an object name
    #[error("transfer of {} failed: {reason}", path.display())]
    Transfer { path: PathBuf, reason: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LifecycleError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Bucket the failure refers to, when there is one
    pub fn bucket(&self) -> Option<&str> {
        match self {
            Self::InvalidDesiredState { bucket, .. }
            | Self::Remote { bucket, .. }
            | Self::RetriesExhausted { bucket, .. }
            | Self::ConflictLoopExhausted { bucket, .. }
            | Self::DeadlineExceeded { bucket, .. } => Some(bucket),
            _ => None,
        }
    }

    /// Underlying store failure, if the error came from a remote call
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Remote { source, .. } | Self::RetriesExhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}
