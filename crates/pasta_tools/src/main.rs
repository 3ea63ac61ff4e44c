//! Import a filesystem paste directory into the redb store.
//!
//! # Usage
//!
//! ```bash
//! # Copy ./data/<id> files into ./data/pastes.redb
//! cargo run -p pasta_tools --bin pasta-migrate
//!
//! # Explicit source and target
//! cargo run -p pasta_tools --bin pasta-migrate -- --from /srv/pasta/files --to /srv/pasta/db
//! ```

use clap::Parser;
use pasta_core::constants::DEFAULT_DATA_DIR;
use pasta_core::store::migrate_directory;
use pasta_core::RedbPasteStore;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filesystem to redb migration for Pasta.
#[derive(Parser, Debug)]
#[command(
    name = "pasta-migrate",
    about = "Copy one-file-per-paste data into a redb store"
)]
struct Args {
    /// Directory holding one file per paste
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    from: PathBuf,

    /// Data directory receiving pastes.redb (defaults to --from)
    #[arg(long)]
    to: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pasta_tools=info,pasta_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let target_dir = args.to.clone().unwrap_or_else(|| args.from.clone());

    if !args.from.is_dir() {
        anyhow::bail!("Source directory {} does not exist", args.from.display());
    }

    let store = RedbPasteStore::open(&target_dir)?;
    tracing::info!(
        "Migrating {} into {}",
        args.from.display(),
        target_dir.display()
    );
    let started = Instant::now();
    let report = migrate_directory(&args.from, &store)?;
    tracing::info!(
        "Migrated {} paste(s), {} already present, {} skipped, {} failed",
        report.migrated,
        report.already_present,
        report.skipped,
        report.failed
    );

    println!("Migration completed in {:.2?}.", started.elapsed());

    if report.failed > 0 {
        anyhow::bail!("{} paste(s) could not be migrated", report.failed);
    }
    Ok(())
}
