//! Paste storage backends.
//!
//! Both backends implement [`PasteStore`] with the same contract:
//! - `create` is insert-if-absent and never overwrites.
//! - every mutation is atomic from a reader's point of view.
//! - malformed identifiers are treated as missing and never touch storage.

/// redb-backed store (one table keyed by identifier).
pub mod database;
/// One-file-per-paste store with staged, atomically published writes.
pub mod fs;
/// Import of a filesystem data directory into another store.
pub mod migrate;

pub use database::RedbPasteStore;
pub use fs::FsPasteStore;
pub use migrate::{migrate_directory, MigrationReport};

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use std::path::Path;
use std::sync::Arc;

/// Result of [`PasteStore::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The entry was written by this call.
    Created,
    /// An entry with the same identifier was already present and left untouched.
    AlreadyExists,
}

/// Durable identifier-to-bytes mapping.
pub trait PasteStore: Send + Sync {
    /// Insert `content` under `id` unless the id is already present.
    ///
    /// # Errors
    /// Returns an error when the write fails. An existing id is not an error.
    fn create(&self, id: &str, content: &[u8]) -> Result<CreateOutcome, AppError>;

    /// Fetch the bytes stored under `id`.
    ///
    /// # Returns
    /// `Ok(None)` when no entry exists.
    fn read(&self, id: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Replace the content stored under `id` wholesale.
    ///
    /// # Returns
    /// `Ok(false)` when `id` was missing at the time of the check.
    fn update(&self, id: &str, content: &[u8]) -> Result<bool, AppError>;

    /// Remove the entry stored under `id`.
    ///
    /// # Returns
    /// `Ok(false)` when no entry existed.
    fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// All stored identifiers in ascending order.
    fn ids(&self) -> Result<Vec<String>, AppError>;
}

/// Open the backend selected by `config`, creating directories/tables as needed.
///
/// # Errors
/// Returns an error when the data directory or database cannot be initialized.
/// Callers at startup should treat this as fatal.
pub fn open_store(config: &Config) -> Result<Arc<dyn PasteStore>, AppError> {
    let data_dir = Path::new(&config.data_dir);
    let store: Arc<dyn PasteStore> = match config.storage {
        StorageBackend::Fs => Arc::new(FsPasteStore::open(data_dir)?),
        StorageBackend::Redb => Arc::new(RedbPasteStore::open(data_dir)?),
    };
    tracing::info!(
        "Opened {} paste store at {}",
        config.storage,
        data_dir.display()
    );
    Ok(store)
}
