//! Typed requests accepted by the file service.

use chrono::{DateTime, Duration, Utc};
use depot_error::{DepotResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Caller-controlled upload settings.
///
/// # Examples
///
/// ```
/// use depot::UploadOptions;
///
/// let options = UploadOptions::default()
///     .with_tags(vec!["holiday".to_string()])
///     .with_is_public(false)
///     .with_expires_in(3600)
///     .with_max_dimension(1920);
/// assert!(options.thumbnail);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct UploadOptions {
    /// Tags attached to the record
    pub tags: Vec<String>,
    /// Readable without authentication
    pub is_public: bool,
    /// Lifetime in seconds from now
    #[setters(strip_option)]
    pub expires_in: Option<u64>,
    /// Absolute expiry; wins over `expires_in`
    #[setters(strip_option)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Generate a thumbnail for images
    pub thumbnail: bool,
    /// Shrink images so neither side exceeds this many pixels
    #[setters(strip_option)]
    pub max_dimension: Option<u32>,
    /// Encoder quality for the shrink
    #[setters(strip_option)]
    pub quality: Option<u8>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            is_public: true,
            expires_in: None,
            expires_at: None,
            thumbnail: true,
            max_dimension: None,
            quality: None,
        }
    }
}

impl UploadOptions {
    /// Absolute expiry these options ask for, if any.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero lifetime or an instant that has
    /// already passed.
    pub fn resolve_expiry(&self, now: DateTime<Utc>) -> DepotResult<Option<DateTime<Utc>>> {
        if let Some(at) = self.expires_at {
            if at <= now {
                return Err(
                    ValidationError::invalid_parameter("expires_at", "must be in the future")
                        .into(),
                );
            }
            return Ok(Some(at));
        }

        match self.expires_in {
            None => Ok(None),
            Some(0) => {
                let reason = "must be at least 1 second";
                Err(ValidationError::invalid_parameter("expires_in", reason).into())
            }
            Some(seconds) => {
                let lifetime = i64::try_from(seconds)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| ValidationError::invalid_parameter("expires_in", "too large"))?;
                let at = now
                    .checked_add_signed(lifetime)
                    .ok_or_else(|| ValidationError::invalid_parameter("expires_in", "too large"))?;
                Ok(Some(at))
            }
        }
    }

    /// Reject out-of-range resize settings.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero dimension or a quality outside
    /// 1 to 100.
    pub fn validate(&self) -> DepotResult<()> {
        if self.max_dimension == Some(0) {
            return Err(
                ValidationError::invalid_parameter("max_dimension", "must be positive").into(),
            );
        }
        if let Some(quality) = self.quality
            && !(1..=100).contains(&quality)
        {
            return Err(ValidationError::invalid_parameter("quality", "must be 1-100").into());
        }
        Ok(())
    }
}

/// One upload.
#[derive(Debug, Clone, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct UploadRequest {
    /// File content
    #[setters(skip)]
    pub bytes: Vec<u8>,
    /// Name supplied by the uploader
    #[setters(skip)]
    pub original_name: String,
    /// MIME type claimed by the uploader
    #[setters(strip_option, into)]
    pub declared_mime: Option<String>,
    /// Upload settings
    pub options: UploadOptions,
}

impl UploadRequest {
    /// Upload `bytes` under `original_name` with default options.
    pub fn new(bytes: impl Into<Vec<u8>>, original_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            original_name: original_name.into(),
            declared_mime: None,
            options: UploadOptions::default(),
        }
    }
}
