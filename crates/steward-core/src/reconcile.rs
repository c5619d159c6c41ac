//! Bucket reconciliation: make a bucket's metadata match a policy
//!
//! ```text
//!            ┌──────── conflict (bounded) ────────┐
//!            ▼                                    │
//!   ┌─────► GET ── not found ──► DECORATE ──► CREATE ──► done
//!   │        │
//!   │      found
//!   │        ▼
//!   │      CHECK ── compliant ──► done
//!   │        │
//!   │    non-compliant
//!   │        ▼
//!   │    DECORATE ──► UPDATE ──► done
//! ```
//!
//! Every remote call runs through the [`RetryingExecutor`]. Only not-found on
//! GET and conflict on CREATE are treated as control flow; everything else
//! ends the reconciliation with a [`LifecycleError`].
//!
//! Concurrent updates of the same bucket are last-write-wins at the storage
//! layer; only concurrent creation is resolved here.

use crate::{
    config::ReconcilerConfig,
    identifier::BucketIdentifier,
    metadata::BucketSnapshot,
    policy::{Compliance, ComplianceChecker, PolicyDecorator},
    retry::RetryingExecutor,
    store::ObjectStore,
    LifecycleError, Operation, Result,
};
use tracing::{debug, info, instrument, warn};

/// What the reconciler found when it inspected the bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComplianceDecision {
    /// No remote mutation was needed
    AlreadyCompliant,
    /// The bucket existed and was updated
    NeedsCorrection,
    /// The bucket was absent and has been created
    DoesNotExist,
}

/// Result of a successful reconciliation
#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileOutcome {
    /// Bucket name
    pub bucket: String,
    /// Decision that led to the final state
    pub decision: ComplianceDecision,
    /// Bucket metadata after reconciliation
    pub snapshot: BucketSnapshot,
    /// Number of GET round trips (excluding retries)
    pub reads: u32,
    /// Number of create attempts lost to a concurrent creator
    pub conflict_cycles: u32,
}

impl ReconcileOutcome {
    /// Whether the bucket was created or updated
    pub fn mutated(&self) -> bool {
        self.decision != ComplianceDecision::AlreadyCompliant
    }
}

enum FetchOutcome {
    Found(BucketSnapshot),
    Absent,
}

enum InsertOutcome {
    Created(BucketSnapshot),
    Raced,
}

enum State {
    Get,
    Check(BucketSnapshot),
    Create,
    Update(BucketSnapshot),
}

/// Drives a bucket towards the state described by a policy
///
/// Holds no per-bucket state, so one reconciler can serve concurrent
/// reconciliations of different buckets.
pub struct BucketReconciler<S> {
    store: S,
    executor: RetryingExecutor,
    config: ReconcilerConfig,
}

impl<S: ObjectStore> BucketReconciler<S> {
    /// Create a new reconciler over `store`
    pub fn new(store: S, config: ReconcilerConfig) -> Self {
        Self {
            store,
            executor: RetryingExecutor::new(config.retry.clone()),
            config,
        }
    }

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Parse `uri` and reconcile the bucket it names
    ///
    /// Invalid identifiers (including nested paths) are rejected before any
    /// remote call is made.
    pub async fn reconcile_uri(
        &self,
        uri: &str,
        decorator: &dyn PolicyDecorator,
        checker: &dyn ComplianceChecker,
    ) -> Result<ReconcileOutcome> {
        let bucket = BucketIdentifier::parse(uri)?;
        self.reconcile(&bucket, decorator, checker).await
    }

    /// Make `bucket` compliant with `checker`, using `decorator` to build the desired state
    #[instrument(skip(self, decorator, checker), fields(bucket = %bucket))]
    pub async fn reconcile(
        &self,
        bucket: &BucketIdentifier,
        decorator: &dyn PolicyDecorator,
        checker: &dyn ComplianceChecker,
    ) -> Result<ReconcileOutcome> {
        let run = self.run(bucket.name(), decorator, checker);
        match self.config.deadline {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
                warn!(?limit, "reconciliation deadline exceeded");
                LifecycleError::DeadlineExceeded {
                    bucket: bucket.name().to_string(),
                    limit,
                }
            })?,
            None => run.await,
        }
    }

    async fn run(
        &self,
        bucket: &str,
        decorator: &dyn PolicyDecorator,
        checker: &dyn ComplianceChecker,
    ) -> Result<ReconcileOutcome> {
        let mut reads = 0;
        let mut conflict_cycles = 0;
        let mut state = State::Get;

        loop {
            state = match state {
                State::Get => {
                    reads += 1;
                    match self.fetch(bucket).await? {
                        FetchOutcome::Found(snapshot) => State::Check(snapshot),
                        FetchOutcome::Absent => {
                            info!(bucket, "bucket does not exist, creating");
                            State::Create
                        }
                    }
                }
                State::Check(snapshot) => match checker.check(snapshot) {
                    Compliance::Compliant(snapshot) => {
                        info!(bucket, "bucket already compliant");
                        return Ok(ReconcileOutcome {
                            bucket: bucket.to_string(),
                            decision: ComplianceDecision::AlreadyCompliant,
                            snapshot,
                            reads,
                            conflict_cycles,
                        });
                    }
                    Compliance::NonCompliant(snapshot) => {
                        info!(bucket, "bucket not compliant, updating");
                        State::Update(self.desired(bucket, decorator, snapshot)?)
                    }
                },
                State::Create => {
                    let desired = self.desired(bucket, decorator, BucketSnapshot::named(bucket))?;
                    match self.insert(bucket, &desired).await? {
                        InsertOutcome::Created(snapshot) => {
                            info!(bucket, "bucket created");
                            return Ok(ReconcileOutcome {
                                bucket: bucket.to_string(),
                                decision: ComplianceDecision::DoesNotExist,
                                snapshot,
                                reads,
                                conflict_cycles,
                            });
                        }
                        InsertOutcome::Raced => {
                            conflict_cycles += 1;
                            if conflict_cycles > self.config.max_conflict_cycles {
                                return Err(LifecycleError::ConflictLoopExhausted {
                                    bucket: bucket.to_string(),
                                    cycles: conflict_cycles,
                                });
                            }
                            warn!(bucket, conflict_cycles, "bucket created concurrently, re-reading");
                            State::Get
                        }
                    }
                }
                State::Update(desired) => {
                    let store = &self.store;
                    let desired = &desired;
                    let snapshot = self
                        .executor
                        .execute(Operation::Update, bucket, move || store.update_bucket(desired))
                        .await
                        .map_err(|e| e.into_lifecycle(bucket, Operation::Update))?;
                    info!(bucket, "bucket updated");
                    return Ok(ReconcileOutcome {
                        bucket: bucket.to_string(),
                        decision: ComplianceDecision::NeedsCorrection,
                        snapshot,
                        reads,
                        conflict_cycles,
                    });
                }
            };
        }
    }

    async fn fetch(&self, bucket: &str) -> Result<FetchOutcome> {
        let store = &self.store;
        match self
            .executor
            .execute(Operation::Get, bucket, move || store.get_bucket(bucket))
            .await
        {
            Ok(snapshot) => Ok(FetchOutcome::Found(snapshot)),
            Err(e) if e.store_error().is_not_found() => Ok(FetchOutcome::Absent),
            Err(e) => Err(e.into_lifecycle(bucket, Operation::Get)),
        }
    }

    async fn insert(&self, bucket: &str, desired: &BucketSnapshot) -> Result<InsertOutcome> {
        let store = &self.store;
        match self
            .executor
            .execute(Operation::Insert, bucket, move || store.insert_bucket(desired))
            .await
        {
            Ok(snapshot) => Ok(InsertOutcome::Created(snapshot)),
            Err(e) if e.store_error().is_conflict() => Ok(InsertOutcome::Raced),
            Err(e) => Err(e.into_lifecycle(bucket, Operation::Insert)),
        }
    }

    fn desired(
        &self,
        bucket: &str,
        decorator: &dyn PolicyDecorator,
        snapshot: BucketSnapshot,
    ) -> Result<BucketSnapshot> {
        let desired = decorator.decorate(snapshot);
        desired
            .validate_desired(bucket)
            .map_err(|reason| LifecycleError::InvalidDesiredState {
                bucket: bucket.to_string(),
                reason,
            })?;
        debug!(bucket, rules = desired.lifecycle.rule.len(), "desired state built");
        Ok(desired)
    }
}
