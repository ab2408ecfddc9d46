//! File lifecycle manager.

use crate::ids::IdGenerator;
use crate::{
    Content, DeleteReport, DepotConfig, Stats, Transformed, UploadOptions, UploadOutcome,
    UploadRequest,
};
use chrono::Utc;
use depot_cache::{ArtifactCache, imaging};
use depot_core::{
    Access, Category, ExpiryUpdate, FileRecord, FileUpdate, Fit, KeyedLocks, OutputFormat,
    THUMBNAIL_PRESET, TransformDescriptor, normalize_tags, resolve_descriptor,
};
use depot_error::{
    AccessError, AccessErrorKind, DepotResult, NotFoundError, ValidationError,
    ValidationErrorKind,
};
use depot_query::{ListQuery, Page, list};
use depot_storage::{BlobStorage, FileSystemStorage, Lookup, MetadataStore};
use depot_validation::{content_hash, resolve_mime, stored_name};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// MIME types in the images category that are served as-is by transforms.
const PASSTHROUGH_IMAGE_TYPES: &[&str] = &["image/svg+xml"];

/// Upload, read, list, transform and delete stored files.
///
/// Owns the metadata store, the blob storage and the artifact cache for one
/// configuration. Construct it once and share it behind an `Arc`.
///
/// # Access
///
/// Records marked public can be read by anyone. For any other record,
/// [`FileService::get`], [`FileService::read_content`] and
/// [`FileService::transform`] require an authenticated [`Access`], and
/// [`FileService::list`] leaves such records out for anonymous callers.
/// [`FileService::sweep`] requires an admin. Upload, update and delete take
/// no [`Access`]; callers gate them before reaching the service.
///
/// # Example
///
/// ```no_run
/// use depot::{DepotConfig, FileService, UploadRequest};
/// use depot_core::Access;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = FileService::new(DepotConfig::load()?).await?;
///
/// let outcome = service
///     .upload(UploadRequest::new(b"hello".to_vec(), "notes.txt"))
///     .await?;
/// let content = service.read_content(&outcome.record.id, Access::anonymous()).await?;
/// assert_eq!(content.bytes, b"hello");
/// # Ok(())
/// # }
/// ```
pub struct FileService {
    config: DepotConfig,
    store: Arc<MetadataStore>,
    blobs: Arc<dyn BlobStorage>,
    cache: Arc<ArtifactCache>,
    upload_locks: KeyedLocks,
    ids: IdGenerator,
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl FileService {
    /// Open the stores described by `config`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a directory cannot be created or the
    /// index cannot be read.
    #[instrument(skip(config), fields(root = %config.storage().upload_root().display()))]
    pub async fn new(config: DepotConfig) -> DepotResult<Self> {
        let blobs = FileSystemStorage::new(config.storage().upload_root())?;
        let cache = ArtifactCache::new(config.storage().cache_root())?;
        let store = MetadataStore::open(config.storage().index_path()).await?;
        info!("File service ready");
        Ok(Self::with_components(
            config,
            Arc::new(store),
            Arc::new(blobs),
            Arc::new(cache),
        ))
    }

    /// Assemble a service from already-open components.
    pub fn with_components(
        config: DepotConfig,
        store: Arc<MetadataStore>,
        blobs: Arc<dyn BlobStorage>,
        cache: Arc<ArtifactCache>,
    ) -> Self {
        Self {
            config,
            store,
            blobs,
            cache,
            upload_locks: KeyedLocks::default(),
            ids: IdGenerator::default(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &DepotConfig {
        &self.config
    }

    /// Store a new file, or return the existing record for identical content.
    ///
    /// Validation runs before anything touches the disk. Image dimensions,
    /// thumbnails and resizing are best-effort: their failures are returned
    /// as warnings and never fail the upload.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing names, empty or oversized
    /// uploads, disallowed types and bad options, and a storage error when
    /// the bytes or the record cannot be written. No record is created on
    /// error.
    #[instrument(
        skip(self, request),
        fields(name = %request.original_name, size = request.bytes.len())
    )]
    pub async fn upload(&self, request: UploadRequest) -> DepotResult<UploadOutcome> {
        let UploadRequest {
            bytes,
            original_name,
            declared_mime,
            options,
        } = request;

        let original_name = original_name.trim().to_string();
        if original_name.is_empty() {
            return Err(
                ValidationError::new(ValidationErrorKind::MissingInput("file name".to_string()))
                    .into(),
            );
        }
        options.validate()?;
        let now = Utc::now();
        let expires_at = options.resolve_expiry(now)?;

        let mime_type = resolve_mime(declared_mime.as_deref(), &original_name, &bytes);
        let category = self.config.policy().check(&mime_type, bytes.len() as u64)?;
        let checksum = content_hash(&bytes);

        let _guard = self.upload_locks.lock(&checksum).await;
        if let Some(existing) = self.store.find_by_checksum(&checksum).await {
            info!(id = %existing.id, "Upload matches stored content");
            return Ok(UploadOutcome {
                record: existing,
                deduplicated: true,
                warnings: Vec::new(),
            });
        }

        let id = self.new_id().await;
        let stored = stored_name(&original_name, &id);
        let path = self.config.storage().object_path(category, &stored);
        self.blobs.store(&path, &bytes).await?;

        let mut record = FileRecord {
            public_url: self.config.storage().public_url(category, &stored),
            id,
            checksum,
            original_name,
            stored_name: stored,
            mime_type,
            category,
            size: bytes.len() as u64,
            tags: normalize_tags(options.tags.iter().map(String::as_str)),
            width: None,
            height: None,
            thumbnail: false,
            uploaded_at: now,
            expires_at,
            downloads: 0,
            is_public: options.is_public,
            path,
        };

        let mut warnings = Vec::new();
        if category == Category::Images {
            self.derive_image_data(&mut record, bytes, &options, &mut warnings)
                .await;
        }

        if let Err(e) = self.store.put(record.clone()).await {
            if let Err(cleanup) = self.blobs.delete(&record.path).await {
                warn!(error = %cleanup, "Failed to remove object after index write failure");
            }
            if let Err(cleanup) = self.cache.purge(&record.id).await {
                warn!(error = %cleanup, "Failed to remove artifacts after index write failure");
            }
            return Err(e);
        }

        info!(id = %record.id, category = %record.category, "Stored upload");
        Ok(UploadOutcome {
            record,
            deduplicated: false,
            warnings,
        })
    }

    /// Dimensions, thumbnail and resize-on-upload for a freshly stored image.
    async fn derive_image_data(
        &self,
        record: &mut FileRecord,
        mut bytes: Vec<u8>,
        options: &UploadOptions,
        warnings: &mut Vec<String>,
    ) {
        let mut dims = match imaging::dimensions(&bytes) {
            Ok(dims) => Some(dims),
            Err(e) => {
                advisory(warnings, &record.id, format!("dimensions unavailable: {}", e));
                None
            }
        };

        if options.thumbnail && !is_passthrough_image(&record.mime_type) {
            let descriptor = self.config.thumbnail().descriptor();
            match self
                .cache
                .get(&record.id, &record.path, &record.mime_type, &descriptor)
                .await
            {
                Ok(_) => record.thumbnail = true,
                Err(e) => advisory(warnings, &record.id, format!("thumbnail failed: {}", e)),
            }
        }

        if let (Some(max), Some((width, height))) = (options.max_dimension, dims)
            && width.max(height) > max
        {
            match OutputFormat::from_mime(&record.mime_type) {
                Some(format) => {
                    let descriptor = TransformDescriptor {
                        width: Some(max),
                        height: Some(max),
                        fit: Some(Fit::Inside),
                        quality: options.quality,
                        ..Default::default()
                    };
                    match imaging::render_blocking(bytes.clone(), descriptor, format).await {
                        Ok(resized) => match self.blobs.store(&record.path, &resized).await {
                            Ok(()) => {
                                debug!(max, "Resized stored image");
                                record.size = resized.len() as u64;
                                bytes = resized;
                                dims = imaging::dimensions(&bytes).ok();
                            }
                            Err(e) => {
                                let message = format!("resize not stored: {}", e);
                                advisory(warnings, &record.id, message);
                            }
                        },
                        Err(e) => advisory(warnings, &record.id, format!("resize failed: {}", e)),
                    }
                }
                None => advisory(
                    warnings,
                    &record.id,
                    format!("resize skipped: cannot re-encode {}", record.mime_type),
                ),
            }
        }

        if let Some((width, height)) = dims {
            record.width = Some(width);
            record.height = Some(height);
        }
    }

    async fn new_id(&self) -> String {
        loop {
            let id = self.ids.next();
            // Ids written by an older layout are not time-ordered
            if !self.store.contains_id(&id).await {
                return id;
            }
            debug!(id, "Identifier collision, drawing again");
        }
    }

    /// Live record by id, evicting it first if it has expired.
    async fn live_record(&self, id: &str) -> DepotResult<FileRecord> {
        match self.store.lookup(id).await {
            Lookup::Live(record) => Ok(record),
            Lookup::Expired(record) => {
                self.evict(&record).await?;
                Err(NotFoundError::file(id).into())
            }
            Lookup::Missing => Err(NotFoundError::file(id).into()),
        }
    }

    async fn evict(&self, record: &FileRecord) -> DepotResult<()> {
        match self.delete(&record.id).await {
            Ok(_) => {
                info!(id = %record.id, "Evicted expired record");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Metadata of a live record.
    ///
    /// # Errors
    ///
    /// Returns not-found for unknown or expired ids and an access error for
    /// non-public records requested anonymously.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str, access: Access) -> DepotResult<FileRecord> {
        let record = self.live_record(id).await?;
        ensure_readable(&record, access)?;
        Ok(record)
    }

    /// Read the stored bytes and count the download.
    ///
    /// # Errors
    ///
    /// Same as [`FileService::get`], plus a storage error when the object
    /// cannot be read.
    #[instrument(skip(self))]
    pub async fn read_content(&self, id: &str, access: Access) -> DepotResult<Content> {
        let record = self.live_record(id).await?;
        ensure_readable(&record, access)?;

        let bytes = self.blobs.retrieve(&record.path).await?;
        let record = self.store.record_download(id).await?;
        debug!(downloads = record.downloads, "Served content");
        Ok(Content {
            bytes,
            mime_type: record.mime_type.clone(),
            record,
        })
    }

    /// Change the public flag, tags or expiry of a live record.
    ///
    /// # Errors
    ///
    /// Returns not-found for unknown or expired ids and a validation error
    /// for an expiry in the past.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: FileUpdate) -> DepotResult<FileRecord> {
        if let Some(ExpiryUpdate::At(at)) = update.expires
            && at <= Utc::now()
        {
            return Err(
                ValidationError::invalid_parameter("expires_at", "must be in the future").into(),
            );
        }

        let record = self.live_record(id).await?;
        if update.is_empty() {
            return Ok(record);
        }

        let updated = self.store.update(id, &update).await?;
        info!("Updated record");
        Ok(updated)
    }

    /// Remove a record with its stored object and cached artifacts.
    ///
    /// Object and cache failures are logged and reported; they never keep
    /// the record alive.
    ///
    /// # Errors
    ///
    /// Returns not-found when no record has this id, and a storage error if
    /// the index cannot be written.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> DepotResult<DeleteReport> {
        let record = match self.store.lookup(id).await {
            Lookup::Live(record) | Lookup::Expired(record) => record,
            Lookup::Missing => return Err(NotFoundError::file(id).into()),
        };

        let (object_removed, object_error) = match self.blobs.delete(&record.path).await {
            Ok(()) => (true, None),
            Err(e) => {
                warn!(error = %e, "Failed to remove stored object");
                (false, Some(e.to_string()))
            }
        };

        let (artifacts_purged, cache_error) = match self.cache.purge(id).await {
            Ok(count) => (count, None),
            Err(e) => {
                warn!(error = %e, "Failed to remove cached artifacts");
                (0, Some(e.to_string()))
            }
        };

        let record = self.store.delete(id).await?;
        info!(object_removed, artifacts_purged, "Deleted record");
        Ok(DeleteReport {
            record,
            object_removed,
            object_error,
            artifacts_purged,
            cache_error,
        })
    }

    /// Delete every expired record. Returns how many were removed.
    ///
    /// Records removed concurrently by another sweep or delete are skipped.
    ///
    /// # Errors
    ///
    /// Returns an access error for non-admin callers and a storage error if
    /// the index cannot be written.
    #[instrument(skip(self))]
    pub async fn sweep(&self, access: Access) -> DepotResult<usize> {
        if !access.admin {
            return Err(AccessError::new(AccessErrorKind::AdminRequired).into());
        }

        let mut removed = 0;
        for record in self.store.expired().await {
            match self.delete(&record.id).await {
                Ok(_) => removed += 1,
                Err(e) if e.is_not_found() => debug!(id = %record.id, "Already removed"),
                Err(e) => return Err(e),
            }
        }

        info!(removed, "Swept expired records");
        Ok(removed)
    }

    /// List live records. Anonymous callers only see public records.
    ///
    /// The page size is clamped to the configured maximum.
    #[instrument(skip(self, query))]
    pub async fn list(&self, access: Access, query: &ListQuery) -> Page<FileRecord> {
        let records: Vec<FileRecord> = self
            .store
            .enumerate()
            .await
            .into_iter()
            .filter(|r| access.authenticated || r.is_public)
            .collect();

        let mut query = query.clone();
        query.limit = self.config.query().clamp_limit(Some(query.limit));
        list(records, &query)
    }

    /// Serve a derived variant of a stored image.
    ///
    /// A named preset wins over explicit parameters. The `thumbnail` preset
    /// takes the configured thumbnail size and quality, so it serves the
    /// artifact generated at upload. Files that are not transformable
    /// images are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns not-found for unknown ids and presets, a validation error for
    /// malformed parameters, an access error for non-public records
    /// requested anonymously, and a transform error when the image cannot be
    /// processed.
    #[instrument(skip(self, params))]
    pub async fn transform(
        &self,
        id: &str,
        access: Access,
        preset: Option<&str>,
        params: &[(&str, &str)],
    ) -> DepotResult<Transformed> {
        let descriptor = match preset.map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case(THUMBNAIL_PRESET) => {
                self.config.thumbnail().descriptor()
            }
            _ => resolve_descriptor(preset, params.iter().copied())?,
        };
        let record = self.live_record(id).await?;
        ensure_readable(&record, access)?;

        if !record.is_image() || is_passthrough_image(&record.mime_type) {
            debug!(mime = %record.mime_type, "Passing through original bytes");
            let bytes = self.blobs.retrieve(&record.path).await?;
            return Ok(Transformed {
                bytes,
                content_type: record.mime_type,
                cache_hit: false,
                passthrough: true,
            });
        }

        let artifact = self
            .cache
            .get(&record.id, &record.path, &record.mime_type, &descriptor)
            .await?;
        Ok(Transformed {
            content_type: artifact.content_type().to_string(),
            cache_hit: *artifact.hit(),
            passthrough: false,
            bytes: artifact.into_bytes(),
        })
    }

    /// Totals over live records.
    pub async fn stats(&self) -> Stats {
        let records = self.store.enumerate().await;
        Stats::from_records(&records)
    }

    /// Live records whose stored object is missing. Never mutates anything.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Vec<FileRecord> {
        let mut missing = Vec::new();
        for record in self.store.enumerate().await {
            let present = self.blobs.exists(&record.path).await.unwrap_or(false);
            if !present {
                warn!(id = %record.id, path = %record.path.display(), "Stored object missing");
                missing.push(record);
            }
        }
        missing.sort_by(|a, b| a.id.cmp(&b.id));
        missing
    }
}

fn ensure_readable(record: &FileRecord, access: Access) -> DepotResult<()> {
    if access.can_read(record) {
        Ok(())
    } else {
        Err(AccessError::new(AccessErrorKind::AuthenticationRequired).into())
    }
}

fn is_passthrough_image(mime: &str) -> bool {
    PASSTHROUGH_IMAGE_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(mime))
}

fn advisory(warnings: &mut Vec<String>, id: &str, message: String) {
    warn!(target: "advisory", id, "{}", message);
    warnings.push(message);
}
