//! # Steward CLI
//!
//! Build-pipeline front end for Bucket Steward.
//!
//! - **expire**: converge a bucket onto a delete-after-N-days lifecycle,
//!   creating the bucket when it does not exist
//! - **upload**: copy a local file into a bucket, optionally stripping a
//!   leading directory
//! - **download**: copy an object into a local directory, optionally
//!   stripping a leading part of its name

pub mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use steward_client::{transfer, StorageClient};
use steward_core::{BucketReconciler, ExpiringLifecycle, ObjectUri, RetryingExecutor};

pub use config::StewardConfig;

#[derive(Parser, Debug)]
#[command(name = "steward")]
#[command(about = "Keep build-pipeline buckets and their lifecycle policies in shape")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "STEWARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage API endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Project that owns newly created buckets
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// OAuth bearer token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Retries per remote call after the first attempt
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Enable debug logging
    #[arg(short, long, global = true, env = "STEWARD_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Make objects in a bucket expire after a number of days
    Expire {
        /// Bucket identifier, e.g. gs://ci-artifacts
        #[arg(long)]
        bucket: String,

        /// Age in days after which objects are deleted
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,

        /// Create-conflict cycles tolerated before giving up
        #[arg(long)]
        max_conflict_cycles: Option<u32>,

        /// Wall-clock limit in seconds (0 = unbounded)
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Upload a local file
    Upload {
        /// File to upload
        #[arg(long)]
        file: PathBuf,

        /// Destination, e.g. gs://ci-artifacts/releases/42
        #[arg(long)]
        dest: String,

        /// Leading directory removed from the file path
        #[arg(long)]
        strip_prefix: Option<PathBuf>,

        /// Content type (guessed from the extension by default)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download an object into a directory
    Download {
        /// Object, e.g. gs://ci-artifacts/releases/42/app.tar
        #[arg(long)]
        source: String,

        /// Local directory
        #[arg(long)]
        dest: PathBuf,

        /// Leading part removed from the object name
        #[arg(long)]
        strip_prefix: Option<String>,
    },
}

impl Cli {
    /// Configuration after applying command-line overrides
    pub fn resolve_config(&self) -> anyhow::Result<StewardConfig> {
        let mut config = StewardConfig::load(self.config.as_deref()).context("failed to load configuration")?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Apply flags on top of file and environment settings
    pub fn apply_overrides(&self, config: &mut StewardConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(project) = &self.project {
            config.project = Some(project.clone());
        }
        if let Some(token) = &self.token {
            config.access_token = Some(token.clone());
        }
        if let Some(retries) = self.retries {
            config.retry.max_retries = retries;
        }
        if let Commands::Expire {
            max_conflict_cycles,
            deadline_secs,
            ..
        } = &self.command
        {
            if let Some(cycles) = max_conflict_cycles {
                config.max_conflict_cycles = *cycles;
            }
            if let Some(secs) = deadline_secs {
                config.deadline_secs = *secs;
            }
        }
    }
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;
    execute(&cli.command, &config).await
}

/// Run a command against resolved settings
pub async fn execute(command: &Commands, config: &StewardConfig) -> anyhow::Result<()> {
    let client = StorageClient::new(config.client_config()).context("failed to build storage client")?;

    match command {
        Commands::Expire { bucket, days, .. } => {
            let reconciler = BucketReconciler::new(client, config.reconciler_config());
            let policy = ExpiringLifecycle::new(*days);
            let outcome = reconciler.reconcile_uri(bucket, &policy, &policy).await?;
            tracing::info!(
                bucket = %outcome.bucket,
                decision = ?outcome.decision,
                days,
                "lifecycle policy in place"
            );
        }
        Commands::Upload {
            file,
            dest,
            strip_prefix,
            content_type,
        } => {
            let dest = ObjectUri::parse(dest)?;
            let executor = RetryingExecutor::new(config.retry.clone());
            let info = transfer::upload_file(
                &client,
                &executor,
                file,
                strip_prefix.as_deref(),
                &dest,
                content_type.as_deref(),
            )
            .await?;
            tracing::info!(object = %info.name, bucket = %info.bucket, "upload complete");
        }
        Commands::Download {
            source,
            dest,
            strip_prefix,
        } => {
            let source = ObjectUri::parse(source)?;
            let executor = RetryingExecutor::new(config.retry.clone());
            let path = transfer::download_to(&client, &executor, &source, strip_prefix.as_deref(), dest).await?;
            tracing::info!(path = %path.display(), "download complete");
        }
    }

    Ok(())
}
