//! Import a filesystem data directory into another paste store.

use super::{CreateOutcome, PasteStore};
use crate::error::AppError;
use crate::ident::is_well_formed;
use crate::validate::is_semantically_empty;
use std::fs;
use std::path::Path;

/// Per-run counters reported by [`migrate_directory`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Files written to the target store.
    pub migrated: usize,
    /// Ids already present in the target store.
    pub already_present: usize,
    /// Files skipped because of their name or content.
    pub skipped: usize,
    /// Files that could not be read or written.
    pub failed: usize,
}

/// Copy every paste file under `source` into `target`, keeping identifiers.
///
/// Directories, files whose names are not paste identifiers, and empty or
/// all-null files are skipped. Per-file failures are logged and counted
/// without aborting the run.
///
/// # Errors
/// Returns an error only if `source` itself cannot be listed.
pub fn migrate_directory(
    source: &Path,
    target: &dyn PasteStore,
) -> Result<MigrationReport, AppError> {
    let mut report = MigrationReport::default();

    for entry in fs::read_dir(source)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Failed to read directory entry: {}", err);
                report.failed += 1;
                continue;
            }
        };
        if entry.file_type().map(|ty| ty.is_dir()).unwrap_or(false) {
            continue;
        }

        let name = entry.file_name();
        let Some(id) = name.to_str().filter(|name| is_well_formed(name)) else {
            tracing::warn!("Skipping {:?}: not a paste identifier", name);
            report.skipped += 1;
            continue;
        };

        let content = match fs::read(entry.path()) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read file {}: {}", id, err);
                report.failed += 1;
                continue;
            }
        };
        if is_semantically_empty(&content) {
            tracing::warn!("Skipping {}: empty content", id);
            report.skipped += 1;
            continue;
        }

        match target.create(id, &content) {
            Ok(CreateOutcome::Created) => {
                tracing::info!("Migrated file: {}", id);
                report.migrated += 1;
            }
            Ok(CreateOutcome::AlreadyExists) => {
                tracing::debug!("Paste {} already present in target", id);
                report.already_present += 1;
            }
            Err(err) => {
                tracing::warn!("Failed to create paste for file {}: {}", id, err);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
