//! Blob storage double with switchable failures.

use async_trait::async_trait;
use depot_error::{DepotResult, StorageError, StorageErrorKind};
use depot_storage::{BlobStorage, FileSystemStorage};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Delegates to a real filesystem backend unless told to fail.
#[derive(Debug)]
pub struct FlakyStorage {
    inner: FileSystemStorage,
    fail_deletes: AtomicBool,
    fail_stores: AtomicBool,
}

impl FlakyStorage {
    pub fn new(inner: FileSystemStorage) -> Self {
        Self {
            inner,
            fail_deletes: AtomicBool::new(false),
            fail_stores: AtomicBool::new(false),
        }
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStorage for FlakyStorage {
    async fn store(&self, path: &Path, data: &[u8]) -> DepotResult<()> {
        if self.fail_stores.load(Ordering::SeqCst) {
            let kind = StorageErrorKind::FileWrite("disk full".to_string());
            return Err(StorageError::new(kind).into());
        }
        self.inner.store(path, data).await
    }

    async fn retrieve(&self, path: &Path) -> DepotResult<Vec<u8>> {
        self.inner.retrieve(path).await
    }

    async fn delete(&self, path: &Path) -> DepotResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(
                StorageError::new(StorageErrorKind::FileDelete("permission denied".to_string()))
                    .into(),
            );
        }
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &Path) -> DepotResult<bool> {
        self.inner.exists(path).await
    }
}
