//! In-memory object store for testing and dry runs

use crate::{
    metadata::BucketSnapshot,
    store::{ObjectStore, StoreResult},
    StoreError,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An in-memory bucket registry
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    buckets: Arc<DashMap<String, BucketSnapshot>>,
    reads: Arc<AtomicU64>,
    mutations: Arc<AtomicU64>,
}

impl MemoryObjectStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bucket without counting it as a mutation
    pub fn with_bucket(self, snapshot: BucketSnapshot) -> Self {
        let mut snapshot = snapshot;
        snapshot.metageneration.get_or_insert(1);
        self.buckets.insert(snapshot.name.clone(), snapshot);
        self
    }

    /// Get the stored metadata of a bucket
    pub fn bucket(&self, name: &str) -> Option<BucketSnapshot> {
        self.buckets.get(name).map(|entry| entry.value().clone())
    }

    /// Get the number of buckets stored
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of `get_bucket` calls served
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful inserts, updates and deletes
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_bucket(&self, name: &str) -> StoreResult<BucketSnapshot> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.bucket(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn insert_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot> {
        match self.buckets.entry(desired.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "bucket {} already exists",
                desired.name
            ))),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let mut created = desired.clone();
                created.metageneration = Some(1);
                created.time_created = Some(now);
                created.updated = Some(now);
                slot.insert(created.clone());
                self.mutations.fetch_add(1, Ordering::SeqCst);
                Ok(created)
            }
        }
    }

    async fn update_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot> {
        let mut entry = self
            .buckets
            .get_mut(&desired.name)
            .ok_or_else(|| StoreError::NotFound(desired.name.clone()))?;

        let current = entry.value();
        let mut updated = desired.clone();
        updated.metageneration = Some(current.metageneration.unwrap_or(0) + 1);
        updated.time_created = current.time_created;
        updated.updated = Some(Utc::now());
        *entry.value_mut() = updated.clone();
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(updated)
    }

    async fn delete_bucket(&self, name: &str) -> StoreResult<()> {
        self.buckets
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Lifecycle, LifecycleRule};

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let store = MemoryObjectStore::new();

        let created = store.insert_bucket(&BucketSnapshot::named("ci-artifacts")).await.unwrap();
        assert_eq!(created.metageneration, Some(1));
        assert!(created.time_created.is_some());

        let conflict = store.insert_bucket(&BucketSnapshot::named("ci-artifacts")).await;
        assert!(matches!(conflict, Err(StoreError::Conflict(_))));

        let desired = created
            .clone()
            .with_lifecycle(Lifecycle::new(vec![LifecycleRule::delete_after_days(3)]));
        let updated = store.update_bucket(&desired).await.unwrap();
        assert_eq!(updated.metageneration, Some(2));
        assert_eq!(updated.time_created, created.time_created);

        let read = store.get_bucket("ci-artifacts").await.unwrap();
        assert_eq!(read.lifecycle, desired.lifecycle);

        store.delete_bucket("ci-artifacts").await.unwrap();
        assert!(store.get_bucket("ci-artifacts").await.unwrap_err().is_not_found());
        assert_eq!(store.mutation_count(), 3);
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_bucket() {
        let store = MemoryObjectStore::new();
        let result = store.update_bucket(&BucketSnapshot::named("ghost-bucket")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.is_empty());
    }
}
