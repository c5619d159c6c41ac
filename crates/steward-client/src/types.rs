//! Common types for the client

use serde::{Deserialize, Serialize};

/// Metadata of a stored object, as returned by an upload
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    /// Object name
    pub name: String,
    /// Bucket name
    pub bucket: String,
    /// Content type
    #[serde(default)]
    pub content_type: Option<String>,
    /// Size in bytes (int64 encoded as a string)
    #[serde(default)]
    pub size: Option<String>,
    /// Base64 MD5 of the content
    #[serde(default)]
    pub md5_hash: Option<String>,
    /// Object generation
    #[serde(default)]
    pub generation: Option<String>,
}

impl ObjectInfo {
    /// Size in bytes, when the service reported one
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }
}
