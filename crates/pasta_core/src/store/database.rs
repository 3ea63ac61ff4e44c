//! Paste storage operations backed by redb.

use super::{CreateOutcome, PasteStore};
use crate::constants::REDB_FILE_NAME;
use crate::error::AppError;
use crate::ident::is_well_formed;
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Canonical paste rows: identifier to raw content bytes.
pub const PASTES: TableDefinition<&str, &[u8]> = TableDefinition::new("pastes");

/// Accessor for the paste table in a redb database.
pub struct RedbPasteStore {
    db: Arc<redb::Database>,
}

impl RedbPasteStore {
    /// Open (or create) `{data_dir}/pastes.redb` and initialize tables.
    ///
    /// # Errors
    /// Returns an error if the directory, database file, or table cannot be
    /// created.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|err| {
            AppError::StorageMessage(format!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                err
            ))
        })?;
        let db = redb::Database::create(data_dir.join(REDB_FILE_NAME))?;
        Self::new(Arc::new(db))
    }

    /// Initialize paste tables on an existing database handle.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(PASTES)?;
        write_txn.commit()?;
        Ok(Self { db })
    }
}

impl PasteStore for RedbPasteStore {
    fn create(&self, id: &str, content: &[u8]) -> Result<CreateOutcome, AppError> {
        if !is_well_formed(id) {
            return Err(AppError::StorageMessage(format!(
                "Refusing to store malformed paste id '{}'",
                id
            )));
        }
        let write_txn = self.db.begin_write()?;
        {
            let mut pastes = write_txn.open_table(PASTES)?;
            if pastes.get(id)?.is_some() {
                return Ok(CreateOutcome::AlreadyExists);
            }
            pastes.insert(id, content)?;
        }
        write_txn.commit()?;
        Ok(CreateOutcome::Created)
    }

    fn read(&self, id: &str) -> Result<Option<Vec<u8>>, AppError> {
        if !is_well_formed(id) {
            return Ok(None);
        }
        let read_txn = self.db.begin_read()?;
        let pastes = read_txn.open_table(PASTES)?;
        let content = pastes.get(id)?.map(|value| value.value().to_vec());
        Ok(content)
    }

    fn update(&self, id: &str, content: &[u8]) -> Result<bool, AppError> {
        if !is_well_formed(id) {
            return Ok(false);
        }
        let write_txn = self.db.begin_write()?;
        {
            let mut pastes = write_txn.open_table(PASTES)?;
            if pastes.get(id)?.is_none() {
                return Ok(false);
            }
            pastes.insert(id, content)?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    fn delete(&self, id: &str) -> Result<bool, AppError> {
        if !is_well_formed(id) {
            return Ok(false);
        }
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut pastes = write_txn.open_table(PASTES)?;
            let removed = pastes.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn ids(&self) -> Result<Vec<String>, AppError> {
        let read_txn = self.db.begin_read()?;
        let pastes = read_txn.open_table(PASTES)?;
        let mut ids = Vec::new();
        for item in pastes.iter()? {
            let (key, _) = item?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }
}
