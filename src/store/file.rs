//! File-per-group durable store.
//!
//! Layout: `{storage_path}/{id}.rkyv`. Writes go to a unique temp file first;
//! creates hard-link it into place (failing if the id exists), updates rename
//! over the old file.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use tracing::{debug, instrument, warn};

use super::GroupStore;
use super::error::{StoreError, StoreResult};
use super::model::StoredRecord;
use crate::group::{GroupRecord, StoredGroup};

const RKYV_EXTENSION: &str = "rkyv";

const TEMP_EXTENSION: &str = "tmp";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
/// Stores [`StoredGroup`] rows as individual files under one directory.
pub struct FileGroupStore {
    storage_path: PathBuf,
}

impl FileGroupStore {
    /// Creates a store rooted at `storage_path`.
    pub fn new(storage_path: PathBuf) -> Self {
        Self { storage_path }
    }

    /// Returns the root storage directory.
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Ensures the root storage directory exists.
    pub fn ensure_storage_path(&self) -> StoreResult<()> {
        if !self.storage_path.exists() {
            fs::create_dir_all(&self.storage_path).map_err(|_| StoreError::StorageUnavailable {
                path: self.storage_path.clone(),
            })?;
        }
        Ok(())
    }

    fn entry_path(&self, id: i64) -> PathBuf {
        self.storage_path.join(format!("{}.{}", id, RKYV_EXTENSION))
    }

    fn temp_entry_path(&self, id: i64) -> PathBuf {
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.storage_path.join(format!(
            "{}.{}.{}.{}",
            id,
            std::process::id(),
            seq,
            TEMP_EXTENSION
        ))
    }

    fn write_temp(&self, row: &StoredRecord) -> StoreResult<PathBuf> {
        self.ensure_storage_path()?;

        let bytes =
            rkyv::to_bytes::<RkyvError>(row).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let temp_path = self.temp_entry_path(row.id);
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        Ok(temp_path)
    }

    /// Reads and decodes the row for `id` (blocking).
    pub fn load(&self, id: i64) -> StoreResult<Option<StoredRecord>> {
        let bytes = match fs::read(self.entry_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);

        let row = rkyv::from_bytes::<StoredRecord, RkyvError>(&aligned).map_err(|e| {
            StoreError::Corrupt {
                id,
                reason: e.to_string(),
            }
        })?;

        if row.id != id {
            return Err(StoreError::Corrupt {
                id,
                reason: format!("file holds group {}", row.id),
            });
        }

        Ok(Some(row))
    }

    /// Writes `stored` unconditionally (blocking). Used for seeding and updates.
    pub fn put(&self, stored: &StoredGroup) -> StoreResult<()> {
        let row = StoredRecord::from(stored);
        let temp_path = self.write_temp(&row)?;
        if let Err(e) = fs::rename(&temp_path, self.entry_path(row.id)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Writes a new row, failing if one already exists (blocking).
    pub fn insert_new(&self, row: &StoredRecord) -> StoreResult<()> {
        let temp_path = self.write_temp(row)?;
        let linked = fs::hard_link(&temp_path, self.entry_path(row.id));
        let _ = fs::remove_file(&temp_path);

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists { id: row.id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `true` if a row for `id` exists.
    pub fn exists(&self, id: i64) -> bool {
        self.entry_path(id).exists()
    }

    /// Lists every stored id (blocking).
    pub fn list_ids(&self) -> StoreResult<Vec<i64>> {
        if !self.storage_path.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.storage_path)? {
            let entry = entry?;
            let path = entry.path();

            if let Some(ext) = path.extension()
                && ext == RKYV_EXTENSION
                && let Some(stem) = path.file_stem()
                && let Some(stem_str) = stem.to_str()
                && let Ok(id) = stem_str.parse::<i64>()
            {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    /// Stages every row as a temp file, then renames each into place.
    ///
    /// A staging failure removes all staged files and fails the call with no
    /// row touched. A failed rename is logged and that row is not counted.
    fn update_existing(&self, records: &[GroupRecord], at: DateTime<Utc>) -> StoreResult<usize> {
        let mut staged: Vec<(i64, PathBuf)> = Vec::with_capacity(records.len());

        for record in records {
            if !self.exists(record.id) {
                debug!(group_id = record.id, "Skipping update for unknown group");
                continue;
            }
            let row = StoredRecord::from(&StoredGroup::new(record.clone(), at));
            match self.write_temp(&row) {
                Ok(temp_path) => staged.push((row.id, temp_path)),
                Err(e) => {
                    for (_, temp_path) in &staged {
                        let _ = fs::remove_file(temp_path);
                    }
                    return Err(e);
                }
            }
        }

        let mut updated = 0;
        for (id, temp_path) in staged {
            match fs::rename(&temp_path, self.entry_path(id)) {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!(group_id = id, error = %e, "Failed to replace stored group");
                    let _ = fs::remove_file(&temp_path);
                }
            }
        }
        Ok(updated)
    }

    fn scan_stale(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<i64>> {
        let cutoff_ms = cutoff.timestamp_millis();
        let mut stale = Vec::new();

        for id in self.list_ids()? {
            match self.load(id) {
                Ok(Some(row)) if row.updated_at <= cutoff_ms => stale.push(id),
                Ok(_) => {}
                Err(e) => warn!(group_id = id, error = %e, "Skipping unreadable record"),
            }
        }

        Ok(stale)
    }

    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(FileGroupStore) -> StoreResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| StoreError::TaskFailed(e.to_string()))?
    }
}

#[async_trait]
impl GroupStore for FileGroupStore {
    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> StoreResult<Option<StoredGroup>> {
        self.blocking(move |store| store.load(id)?.map(StoredRecord::into_stored).transpose())
            .await
    }

    #[instrument(skip(self, record), fields(group_id = record.id))]
    async fn create(&self, record: &GroupRecord, at: DateTime<Utc>) -> StoreResult<StoredGroup> {
        let row = StoredRecord::new(record, at);
        self.blocking(move |store| {
            store.insert_new(&row)?;
            row.into_stored()
        })
        .await
    }

    #[instrument(skip(self, records), fields(batch_size = records.len()))]
    async fn bulk_update(&self, records: &[GroupRecord], at: DateTime<Utc>) -> StoreResult<usize> {
        let records = records.to_vec();
        self.blocking(move |store| store.update_existing(&records, at))
            .await
    }

    #[instrument(skip(self))]
    async fn stale_ids(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<i64>> {
        self.blocking(move |store| store.scan_stale(cutoff)).await
    }
}
