//! # Steward Client
//!
//! HTTP client for a JSON object-storage API (Google Cloud Storage style).
//!
//! ## Features
//!
//! - **Bucket metadata**: get, insert, update and delete, exposed through
//!   [`steward_core::ObjectStore`] so the reconciler can drive it
//! - **Typed failures**: HTTP statuses mapped onto not-found, conflict,
//!   forbidden, malformed and transient failures
//! - **Transfers**: single-request upload and download, with path-prefix
//!   stripping between local paths and object names
//!
//! ## Example
//!
//! ```rust,ignore
//! use steward_client::{Config, StorageClient};
//! use steward_core::{BucketReconciler, ExpiringLifecycle, ReconcilerConfig};
//!
//! let client = StorageClient::new(
//!     Config::default().with_token(token).with_project("my-project"),
//! )?;
//! let reconciler = BucketReconciler::new(client, ReconcilerConfig::default());
//! let policy = ExpiringLifecycle::new(30);
//! reconciler.reconcile_uri("gs://ci-artifacts", &policy, &policy).await?;
//! ```

mod client;
mod config;
pub mod error;
pub mod transfer;
mod types;

pub use client::StorageClient;
pub use config::{Config, DEFAULT_ENDPOINT};
pub use error::{ClientError, Result};
pub use types::*;
