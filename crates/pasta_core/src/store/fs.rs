//! Filesystem paste store.
//!
//! Layout: `{root}/{id}` holds the raw bytes of each paste; `{root}/.tmp/`
//! holds staged writes. Content is always written in full to a staging file
//! first and then published:
//! - create: `hard_link(staged, final)`, which fails if `final` exists, so
//!   concurrent creates of one id produce exactly one published file.
//! - update: `rename(staged, final)`, which atomically replaces the old file.

use super::{CreateOutcome, PasteStore};
use crate::constants::STAGING_DIR_NAME;
use crate::error::AppError;
use crate::ident::is_well_formed;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// One-file-per-paste store rooted at a data directory.
pub struct FsPasteStore {
    root: PathBuf,
    staging: PathBuf,
}

/// Staged file removed on drop unless it was consumed by a rename.
struct StagedFile {
    path: PathBuf,
    consumed: bool,
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.consumed {
            return;
        }
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove staged paste {}: {}",
                    self.path.display(),
                    err
                );
            }
        }
    }
}

impl FsPasteStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// # Errors
    /// Returns an error if the data or staging directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, AppError> {
        let root = root.as_ref().to_path_buf();
        let staging = root.join(STAGING_DIR_NAME);
        fs::create_dir_all(&staging).map_err(|err| {
            AppError::StorageMessage(format!(
                "Failed to create data directory {}: {}",
                staging.display(),
                err
            ))
        })?;
        Ok(Self { root, staging })
    }

    fn paste_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    fn stage(&self, content: &[u8]) -> Result<StagedFile, AppError> {
        let path = self.staging.join(uuid::Uuid::new_v4().to_string());
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        let staged = StagedFile {
            path,
            consumed: false,
        };
        file.write_all(content)?;
        file.sync_all()?;
        Ok(staged)
    }
}

impl PasteStore for FsPasteStore {
    fn create(&self, id: &str, content: &[u8]) -> Result<CreateOutcome, AppError> {
        if !is_well_formed(id) {
            return Err(AppError::StorageMessage(format!(
                "Refusing to store malformed paste id '{}'",
                id
            )));
        }
        let target = self.paste_path(id);
        if target.exists() {
            return Ok(CreateOutcome::AlreadyExists);
        }

        let staged = self.stage(content)?;
        match fs::hard_link(&staged.path, &target) {
            Ok(()) => Ok(CreateOutcome::Created),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(CreateOutcome::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    fn read(&self, id: &str) -> Result<Option<Vec<u8>>, AppError> {
        if !is_well_formed(id) {
            return Ok(None);
        }
        match fs::read(self.paste_path(id)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, id: &str, content: &[u8]) -> Result<bool, AppError> {
        if !is_well_formed(id) {
            return Ok(false);
        }
        let target = self.paste_path(id);
        if !target.is_file() {
            return Ok(false);
        }

        let mut staged = self.stage(content)?;
        fs::rename(&staged.path, &target)?;
        staged.consumed = true;
        Ok(true)
    }

    fn delete(&self, id: &str) -> Result<bool, AppError> {
        if !is_well_formed(id) {
            return Ok(false);
        }
        match fs::remove_file(self.paste_path(id)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn ids(&self) -> Result<Vec<String>, AppError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_well_formed(name) {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
