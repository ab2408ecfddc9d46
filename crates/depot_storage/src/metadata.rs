//! Authoritative metadata index.
//!
//! The index is a map from record id to [`FileRecord`], held in memory and
//! persisted as one JSON document. Every mutation runs under the write lock
//! and is applied to a copy of the index; the copy is written to disk
//! (temp file + rename) and only then swapped in. A failed persist leaves
//! both the file and the in-memory index at the previous state.

use crate::write_atomic;
use chrono::{DateTime, Utc};
use depot_core::{FileRecord, FileUpdate};
use depot_error::{DepotResult, JsonError, NotFoundError, StorageError, StorageErrorKind};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Result of a raw id lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Record exists and has not expired
    Live(FileRecord),
    /// Record exists but its expiry has passed
    Expired(FileRecord),
    /// No record with this id
    Missing,
}

#[derive(Debug, Clone, Default)]
struct Index {
    records: HashMap<String, FileRecord>,
    by_checksum: HashMap<String, Vec<String>>,
}

impl Index {
    fn from_records(records: HashMap<String, FileRecord>) -> Self {
        let mut index = Self::default();
        for (_, record) in records {
            index.insert(record);
        }
        index
    }

    fn insert(&mut self, record: FileRecord) {
        if let Some(previous) = self.records.get(&record.id)
            && previous.checksum != record.checksum
        {
            let (id, checksum) = (previous.id.clone(), previous.checksum.clone());
            self.unlink_checksum(&checksum, &id);
        }
        let ids = self.by_checksum.entry(record.checksum.clone()).or_default();
        if !ids.contains(&record.id) {
            ids.push(record.id.clone());
        }
        self.records.insert(record.id.clone(), record);
    }

    fn remove(&mut self, id: &str) -> Option<FileRecord> {
        let record = self.records.remove(id)?;
        self.unlink_checksum(&record.checksum, id);
        Some(record)
    }

    fn unlink_checksum(&mut self, checksum: &str, id: &str) {
        if let Some(ids) = self.by_checksum.get_mut(checksum) {
            ids.retain(|existing| existing != id);
            if ids.is_empty() {
                self.by_checksum.remove(checksum);
            }
        }
    }

    fn live(&self, id: &str, now: DateTime<Utc>) -> Option<&FileRecord> {
        self.records.get(id).filter(|r| !r.is_expired_at(now))
    }

    fn live_mut(&mut self, id: &str, now: DateTime<Utc>) -> Option<&mut FileRecord> {
        self.records.get_mut(id).filter(|r| !r.is_expired_at(now))
    }
}

/// In-memory record index with write-through JSON persistence.
///
/// One instance owns one index file for the lifetime of the process.
/// Construct it once and share it behind an `Arc`.
#[derive(Debug)]
pub struct MetadataStore {
    index_path: PathBuf,
    state: RwLock<Index>,
}

impl MetadataStore {
    /// Open the index at `index_path`.
    ///
    /// A missing file is an empty store. The parent directory is created if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file exists but cannot be read or
    /// parsed.
    #[instrument(skip(index_path), fields(path = %index_path.as_ref().display()))]
    pub async fn open(index_path: impl AsRef<Path>) -> DepotResult<Self> {
        let index_path = index_path.as_ref().to_path_buf();

        if let Some(parent) = index_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let records: HashMap<String, FileRecord> = match tokio::fs::read(&index_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StorageError::new(StorageErrorKind::IndexCorrupt(format!(
                    "{}: {}",
                    index_path.display(),
                    e
                )))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No index file, starting empty");
                HashMap::new()
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    index_path.display(),
                    e
                )))
                .into());
            }
        };

        info!(records = records.len(), "Opened metadata index");
        Ok(Self {
            index_path,
            state: RwLock::new(Index::from_records(records)),
        })
    }

    /// Location of the persisted index.
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Apply `f` to a copy of the index, persist the copy, then publish it.
    async fn mutate<T>(&self, f: impl FnOnce(&mut Index) -> DepotResult<T>) -> DepotResult<T> {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }

    async fn persist(&self, index: &Index) -> DepotResult<()> {
        let ordered: BTreeMap<&String, &FileRecord> = index.records.iter().collect();
        let bytes = serde_json::to_vec_pretty(&ordered)
            .map_err(|e| JsonError::new(format!("Failed to serialize index: {}", e)))?;
        write_atomic(&self.index_path, &bytes).await.map_err(|e| {
            StorageError::new(StorageErrorKind::IndexWrite(format!(
                "{}: {}",
                self.index_path.display(),
                e
            )))
        })?;
        debug!(records = index.records.len(), "Persisted metadata index");
        Ok(())
    }

    /// Insert or overwrite a record by id.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn put(&self, record: FileRecord) -> DepotResult<()> {
        self.mutate(|index| {
            index.insert(record);
            Ok(())
        })
        .await
    }

    /// Live record by id. Expired records are reported as absent.
    pub async fn get(&self, id: &str) -> Option<FileRecord> {
        self.state.read().await.live(id, Utc::now()).cloned()
    }

    /// Raw lookup that distinguishes expired records from missing ones.
    pub async fn lookup(&self, id: &str) -> Lookup {
        let now = Utc::now();
        match self.state.read().await.records.get(id) {
            Some(record) if record.is_expired_at(now) => Lookup::Expired(record.clone()),
            Some(record) => Lookup::Live(record.clone()),
            None => Lookup::Missing,
        }
    }

    /// True when any record, live or expired, uses this id.
    pub async fn contains_id(&self, id: &str) -> bool {
        self.state.read().await.records.contains_key(id)
    }

    /// Live record with the given checksum, if any.
    pub async fn find_by_checksum(&self, checksum: &str) -> Option<FileRecord> {
        let now = Utc::now();
        let state = self.state.read().await;
        state
            .by_checksum
            .get(checksum)?
            .iter()
            .find_map(|id| state.live(id, now))
            .cloned()
    }

    /// Remove a record.
    ///
    /// # Errors
    ///
    /// Returns not-found when no record has this id.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> DepotResult<FileRecord> {
        self.mutate(|index| index.remove(id).ok_or_else(|| NotFoundError::file(id).into()))
            .await
    }

    /// Apply an update to a live record and return the result.
    ///
    /// # Errors
    ///
    /// Returns not-found for missing or expired records.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: &FileUpdate) -> DepotResult<FileRecord> {
        let now = Utc::now();
        self.mutate(|index| {
            let record = index
                .live_mut(id, now)
                .ok_or_else(|| NotFoundError::file(id))?;
            update.apply(record);
            Ok(record.clone())
        })
        .await
    }

    /// Increment the download counter of a live record.
    ///
    /// # Errors
    ///
    /// Returns not-found for missing or expired records.
    #[instrument(skip(self))]
    pub async fn record_download(&self, id: &str) -> DepotResult<FileRecord> {
        let now = Utc::now();
        self.mutate(|index| {
            let record = index
                .live_mut(id, now)
                .ok_or_else(|| NotFoundError::file(id))?;
            record.downloads = record.downloads.saturating_add(1);
            Ok(record.clone())
        })
        .await
    }

    /// All live records, in no particular order.
    pub async fn enumerate(&self) -> Vec<FileRecord> {
        let now = Utc::now();
        self.state
            .read()
            .await
            .records
            .values()
            .filter(|r| !r.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Every record, expired ones included.
    pub async fn all_records(&self) -> Vec<FileRecord> {
        self.state.read().await.records.values().cloned().collect()
    }

    /// Records whose expiry has passed.
    pub async fn expired(&self) -> Vec<FileRecord> {
        let now = Utc::now();
        self.state
            .read()
            .await
            .records
            .values()
            .filter(|r| r.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Number of records, live or expired.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// True when the index holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
