//! On-disk artifact cache.

use crate::imaging::{output_format, render_blocking};
use depot_core::{KeyedLocks, OutputFormat, TransformDescriptor};
use depot_error::{DepotResult, StorageError, StorageErrorKind};
use depot_storage::write_atomic;
use derive_getters::Getters;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// One derived artifact as served to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Artifact {
    /// Encoded bytes
    bytes: Vec<u8>,
    /// Encoding of `bytes`
    format: OutputFormat,
    /// True when served from the cache without computing
    hit: bool,
}

impl Artifact {
    /// MIME type of the encoded bytes.
    pub fn content_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Take the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Derived-image cache rooted at one directory.
///
/// Layout: `{root}/{file_id}/{sha256(key)}.{ext}` where the key is
/// `{file_id}:{canonical descriptor}:{encoding}`. Artifacts are immutable
/// once written and are only removed by [`ArtifactCache::purge`].
///
/// Computing an artifact holds its file id shared from the source read
/// through the publish; purging holds it exclusively. A purge therefore
/// never runs between a render and its write, and a computation that
/// starts after a purge finds the source gone.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
    locks: KeyedLocks,
    file_locks: KeyedLocks,
}

impl ArtifactCache {
    /// Create a cache under `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> DepotResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;
        info!(path = %root.display(), "Created artifact cache");
        Ok(Self {
            root,
            locks: KeyedLocks::default(),
            file_locks: KeyedLocks::default(),
        })
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The cache key for an artifact.
    ///
    /// # Examples
    ///
    /// ```
    /// use depot_cache::ArtifactCache;
    /// use depot_core::{OutputFormat, TransformDescriptor};
    ///
    /// let descriptor = TransformDescriptor { width: Some(300), ..Default::default() };
    /// assert_eq!(
    ///     ArtifactCache::cache_key("abc", &descriptor, OutputFormat::Png),
    ///     "abc:width=300:png"
    /// );
    /// ```
    pub fn cache_key(
        file_id: &str,
        descriptor: &TransformDescriptor,
        format: OutputFormat,
    ) -> String {
        format!("{}:{}:{}", file_id, descriptor.canonical(), format)
    }

    /// Where the artifact for this key lives.
    ///
    /// # Errors
    ///
    /// Returns an invalid-path error if `file_id` is not a plain name.
    pub fn artifact_path(
        &self,
        file_id: &str,
        descriptor: &TransformDescriptor,
        format: OutputFormat,
    ) -> DepotResult<PathBuf> {
        let key = Self::cache_key(file_id, descriptor, format);
        let digest = format!("{:x}", Sha256::digest(key.as_bytes()));
        Ok(self
            .file_dir(file_id)?
            .join(format!("{}.{}", digest, format.extension())))
    }

    fn file_dir(&self, file_id: &str) -> DepotResult<PathBuf> {
        let plain = !file_id.is_empty()
            && file_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !plain {
            let kind = StorageErrorKind::InvalidPath(file_id.to_string());
            return Err(StorageError::new(kind).into());
        }
        Ok(self.root.join(file_id))
    }

    /// Fetch or compute the artifact for `descriptor` applied to the file at
    /// `source_path`.
    ///
    /// `source_mime` picks the output encoding when the descriptor leaves it
    /// unset. Concurrent calls for the same key compute once; the others
    /// see the result as a hit.
    ///
    /// # Errors
    ///
    /// Returns a transform error for undecodable sources or encoder
    /// failures and a storage error when the source cannot be read or the
    /// artifact cannot be written. No artifact is left behind on failure.
    #[instrument(skip(self, source_path, descriptor), fields(canonical = %descriptor.canonical()))]
    pub async fn get(
        &self,
        file_id: &str,
        source_path: &Path,
        source_mime: &str,
        descriptor: &TransformDescriptor,
    ) -> DepotResult<Artifact> {
        let format = output_format(descriptor, source_mime);
        let path = self.artifact_path(file_id, descriptor, format)?;

        if let Some(bytes) = read_existing(&path).await? {
            debug!(path = %path.display(), "Artifact cache hit");
            return Ok(Artifact {
                bytes,
                format,
                hit: true,
            });
        }

        let _file = self.file_locks.lock_shared(file_id).await;
        let key = Self::cache_key(file_id, descriptor, format);
        let _guard = self.locks.lock(&key).await;

        // Another caller may have finished while we waited
        if let Some(bytes) = read_existing(&path).await? {
            debug!(path = %path.display(), "Artifact computed concurrently");
            return Ok(Artifact {
                bytes,
                format,
                hit: true,
            });
        }

        let source = tokio::fs::read(source_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(source_path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    source_path.display(),
                    e
                )))
            }
        })?;

        let bytes = render_blocking(source, descriptor.clone(), format).await?;
        write_atomic(&path, &bytes).await?;

        info!(path = %path.display(), size = bytes.len(), "Computed artifact");
        Ok(Artifact {
            bytes,
            format,
            hit: false,
        })
    }

    /// True when the artifact for this key has been computed.
    pub async fn contains(
        &self,
        file_id: &str,
        descriptor: &TransformDescriptor,
        format: OutputFormat,
    ) -> bool {
        match self.artifact_path(file_id, descriptor, format) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Number of artifacts stored for `file_id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory exists but cannot be read.
    pub async fn count(&self, file_id: &str) -> DepotResult<usize> {
        let dir = self.file_dir(file_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
                .into());
            }
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", dir.display(), e)))
        })? {
            let is_artifact = !entry.file_name().to_string_lossy().ends_with(".tmp");
            if is_artifact {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Remove every artifact for `file_id` and return how many there were.
    ///
    /// Waits for in-flight computations for `file_id` to publish first, so
    /// their artifacts are counted and removed too.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be removed.
    #[instrument(skip(self))]
    pub async fn purge(&self, file_id: &str) -> DepotResult<usize> {
        let _file = self.file_locks.lock(file_id).await;
        let removed = self.count(file_id).await?;
        if removed == 0 {
            return Ok(0);
        }

        let dir = self.file_dir(file_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileDelete(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
                .into());
            }
        }

        info!(file_id, removed, "Purged artifacts");
        Ok(removed)
    }
}

async fn read_existing(path: &Path) -> DepotResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
        .into()),
    }
}
