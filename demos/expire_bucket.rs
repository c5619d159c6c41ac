//! Lifecycle reconciliation walkthrough against the in-memory store
//!
//! This example demonstrates:
//! - Creating a missing bucket with an expiry policy
//! - Re-running against a compliant bucket (no writes)
//! - Correcting a bucket whose lifecycle drifted
//!
//! Run with: cargo run --example expire_bucket

use std::sync::Arc;
use steward_core::{
    BucketReconciler, BucketSnapshot, ExpiringLifecycle, Lifecycle, LifecycleRule,
    MemoryObjectStore, ReconcilerConfig, RetryConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Bucket Steward - Expiry Policy Example\n");

    let store = Arc::new(
        MemoryObjectStore::new().with_bucket(
            BucketSnapshot::named("nightly-builds")
                .with_lifecycle(Lifecycle::new(vec![LifecycleRule::delete_after_days(90)])),
        ),
    );
    let reconciler = BucketReconciler::new(
        Arc::clone(&store),
        ReconcilerConfig::new(RetryConfig::immediate(2)),
    );
    let policy = ExpiringLifecycle::new(30);

    // ==================== Missing bucket ====================

    println!("Reconciling gs://ci-artifacts (does not exist yet)...");
    let outcome = reconciler.reconcile_uri("gs://ci-artifacts", &policy, &policy).await?;
    println!("   {:?}, metageneration {:?}", outcome.decision, outcome.snapshot.metageneration);

    // ==================== Compliant bucket ====================

    println!("\nReconciling gs://ci-artifacts again...");
    let before = store.mutation_count();
    let outcome = reconciler.reconcile_uri("gs://ci-artifacts", &policy, &policy).await?;
    println!(
        "   {:?}, {} new writes",
        outcome.decision,
        store.mutation_count() - before
    );

    // ==================== Drifted bucket ====================

    println!("\nReconciling gs://nightly-builds (expires after 90 days)...");
    let outcome = reconciler.reconcile_uri("gs://nightly-builds", &policy, &policy).await?;
    println!("   {:?}, lifecycle now:", outcome.decision);
    println!("{}", serde_json::to_string_pretty(&outcome.snapshot.lifecycle)?);

    // ==================== Invalid identifier ====================

    println!("\nReconciling gs://ci-artifacts/nested...");
    match reconciler.reconcile_uri("gs://ci-artifacts/nested", &policy, &policy).await {
        Ok(_) => println!("   unexpectedly accepted"),
        Err(e) => println!("   rejected: {}", e),
    }

    println!("\nDone.");
    Ok(())
}
