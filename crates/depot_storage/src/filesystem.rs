//! Filesystem-based blob storage implementation.
//!
//! Uploaded bytes are organized by category, one file per record:
//!
//! ```text
//! /var/depot/uploads/
//! ├── images/
//! │   └── photo-3f9c1a7e52b04d11.png
//! ├── documents/
//! │   └── report-a01b2c3d4e5f6071.pdf
//! └── others/
//!     └── archive-0badc0ffee123456.zip
//! ```

use crate::BlobStorage;
use depot_core::Category;
use depot_error::{DepotResult, StorageError, StorageErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem storage backend.
///
/// # Features
///
/// - **Atomic writes**: temp file + rename, readers never see partial data
/// - **Confined paths**: every operation is checked to stay under the base path
/// - **Organized structure**: one directory per category
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    base_path: PathBuf,
}

impl FileSystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> DepotResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem storage");
        Ok(Self { base_path })
    }

    /// Root directory of this backend.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the filesystem path for a stored name in a category.
    ///
    /// Structure: `{base}/{category}/{stored_name}`
    pub fn path_for(&self, category: Category, stored_name: &str) -> PathBuf {
        self.base_path.join(category.as_str()).join(stored_name)
    }

    /// Reject paths that escape the base directory.
    fn confine(&self, path: &Path) -> DepotResult<()> {
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !path.starts_with(&self.base_path) {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(
                path.display().to_string(),
            ))
            .into());
        }
        Ok(())
    }
}

/// Write `data` to `path` through a uniquely named sibling temp file and an
/// atomic rename. Parent directories are created as needed.
///
/// # Errors
///
/// Returns a storage error if the directory, the temp file, or the rename
/// fails. The temp file is removed best-effort on failure.
pub async fn write_atomic(path: &Path, data: &[u8]) -> DepotResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }

    let temp_path = temp_sibling(path);
    if let Err(e) = tokio::fs::write(&temp_path, data).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
        .into());
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        )))
        .into());
    }

    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n))
}

#[async_trait::async_trait]
impl BlobStorage for FileSystemStorage {
    #[tracing::instrument(skip(self, data), fields(path = %path.display(), size = data.len()))]
    async fn store(&self, path: &Path, data: &[u8]) -> DepotResult<()> {
        self.confine(path)?;
        write_atomic(path, data).await?;

        tracing::info!(path = %path.display(), size = data.len(), "Stored file");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn retrieve(&self, path: &Path) -> DepotResult<Vec<u8>> {
        self.confine(path)?;

        let data = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::debug!(path = %path.display(), size = data.len(), "Retrieved file");
        Ok(data)
    }

    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn delete(&self, path: &Path) -> DepotResult<()> {
        self.confine(path)?;

        tokio::fs::remove_file(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileDelete(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::info!(path = %path.display(), "Deleted file");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn exists(&self, path: &Path) -> DepotResult<bool> {
        self.confine(path)?;
        Ok(tokio::fs::try_exists(path).await.unwrap_or(false))
    }
}
