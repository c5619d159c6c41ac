//! # Steward Core
//!
//! Bucket lifecycle reconciliation for Bucket Steward.
//!
//! This crate provides:
//! - **Identifiers**: `scheme://bucket` and `scheme://bucket/object` parsing and validation
//! - **Bucket metadata**: snapshots and lifecycle rules in the storage API's JSON shape
//! - **Object store trait**: the get/insert/update/delete boundary, plus an in-memory store
//! - **Retrying executor**: bounded retries for transient failures
//! - **Reconciler**: the get → check → create-or-update state machine
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Caller (CLI, build step)              │
//! │   identifier + decorator + checker      │
//! ├─────────────────────────────────────────┤
//! │          BucketReconciler               │
//! ├─────────────────────────────────────────┤
//! │          RetryingExecutor               │
//! ├─────────────────────────────────────────┤
//! │   ObjectStore (HTTP client / memory)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use steward_core::{BucketReconciler, ExpiringLifecycle, MemoryObjectStore, ReconcilerConfig};
//!
//! let reconciler = BucketReconciler::new(MemoryObjectStore::new(), ReconcilerConfig::default());
//! let policy = ExpiringLifecycle::new(30);
//! let outcome = reconciler.reconcile_uri("gs://ci-artifacts", &policy, &policy).await?;
//! ```

pub mod config;
pub mod error;
pub mod identifier;
pub mod memory;
pub mod metadata;
pub mod policy;
pub mod reconcile;
pub mod retry;
pub mod store;

pub use config::ReconcilerConfig;
pub use error::{FailureKind, LifecycleError, Operation, Result, StoreError};
pub use identifier::{BucketIdentifier, ObjectUri};
pub use memory::MemoryObjectStore;
pub use metadata::{BucketSnapshot, Lifecycle, LifecycleRule, RuleAction, RuleCondition};
pub use policy::{Compliance, ComplianceChecker, ExpiringLifecycle, PolicyDecorator};
pub use reconcile::{BucketReconciler, ComplianceDecision, ReconcileOutcome};
pub use retry::{RetryConfig, RetryError, RetryingExecutor};
pub use store::{ObjectStore, StoreResult};
