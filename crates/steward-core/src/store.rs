//! The object store boundary used by the reconciler

use crate::{metadata::BucketSnapshot, StoreError};
use async_trait::async_trait;

/// Result of a single remote call
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Bucket metadata operations against a storage backend
///
/// Implementations report failures through the typed [`StoreError`]
/// variants so callers can tell not-found and conflict apart from
/// transient transport trouble.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the current metadata of a bucket
    async fn get_bucket(&self, name: &str) -> StoreResult<BucketSnapshot>;

    /// Create a bucket; fails with `Conflict` if the name is taken
    async fn insert_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot>;

    /// Replace the metadata of an existing bucket
    async fn update_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, name: &str) -> StoreResult<()>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    async fn get_bucket(&self, name: &str) -> StoreResult<BucketSnapshot> {
        (**self).get_bucket(name).await
    }

    async fn insert_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot> {
        (**self).insert_bucket(desired).await
    }

    async fn update_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot> {
        (**self).update_bucket(desired).await
    }

    async fn delete_bucket(&self, name: &str) -> StoreResult<()> {
        (**self).delete_bucket(name).await
    }
}
