//! Per-category upload policy.
//!
//! Size ceilings and type allow-lists live in a [`PolicyTable`], loaded
//! from configuration:
//!
//! ```toml
//! [policy.images]
//! max_bytes = 10_485_760
//! allowed_types = ["image/jpeg", "image/png"]
//!
//! [policy.others]
//! max_bytes = 26_214_400
//! allowed_types = []   # empty list accepts any type
//! ```

use crate::{classify, normalize_mime};
use depot_core::Category;
use depot_error::{DepotResult, ValidationError, ValidationErrorKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const MB: u64 = 1024 * 1024;

/// Limits applied to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Largest accepted upload in bytes
    pub max_bytes: u64,
    /// Accepted MIME types; empty accepts anything
    #[serde(default)]
    pub allowed_types: Vec<String>,
}

impl CategoryPolicy {
    fn new(max_bytes: u64, allowed: &[&str]) -> Self {
        Self {
            max_bytes,
            allowed_types: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether `mime` is on this category's allow-list.
    pub fn allows(&self, mime: &str) -> bool {
        self.allowed_types.is_empty()
            || self
                .allowed_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(mime))
    }
}

/// Size and type policy for every category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTable {
    /// Policy for images
    pub images: CategoryPolicy,
    /// Policy for documents
    pub documents: CategoryPolicy,
    /// Policy for videos
    pub videos: CategoryPolicy,
    /// Policy for audio
    pub audio: CategoryPolicy,
    /// Policy for everything else
    pub others: CategoryPolicy,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            images: CategoryPolicy::new(
                10 * MB,
                &[
                    "image/jpeg",
                    "image/png",
                    "image/gif",
                    "image/webp",
                    "image/svg+xml",
                    "image/bmp",
                    "image/tiff",
                    "image/avif",
                    "image/x-icon",
                ],
            ),
            documents: CategoryPolicy::new(
                50 * MB,
                &[
                    "application/pdf",
                    "text/plain",
                    "text/markdown",
                    "text/csv",
                    "application/json",
                    "application/xml",
                    "text/xml",
                    "application/rtf",
                    "application/msword",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    "application/vnd.ms-excel",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                    "application/vnd.ms-powerpoint",
                    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                    "application/vnd.oasis.opendocument.text",
                    "application/vnd.oasis.opendocument.spreadsheet",
                    "application/vnd.oasis.opendocument.presentation",
                ],
            ),
            videos: CategoryPolicy::new(
                500 * MB,
                &[
                    "video/mp4",
                    "video/webm",
                    "video/ogg",
                    "video/quicktime",
                    "video/x-msvideo",
                    "video/x-matroska",
                    "video/mpeg",
                ],
            ),
            audio: CategoryPolicy::new(
                50 * MB,
                &[
                    "audio/mpeg",
                    "audio/wav",
                    "audio/x-wav",
                    "audio/ogg",
                    "audio/webm",
                    "audio/aac",
                    "audio/flac",
                    "audio/x-flac",
                    "audio/mp4",
                    "audio/x-m4a",
                ],
            ),
            others: CategoryPolicy::new(25 * MB, &[]),
        }
    }
}

impl PolicyTable {
    /// Policy for a category.
    pub fn get(&self, category: Category) -> &CategoryPolicy {
        match category {
            Category::Images => &self.images,
            Category::Documents => &self.documents,
            Category::Videos => &self.videos,
            Category::Audio => &self.audio,
            Category::Others => &self.others,
        }
    }

    /// Classify `mime` and check it against the category's type and size
    /// limits. Returns the category on success.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty uploads, types outside the
    /// allow-list, and sizes above the ceiling.
    ///
    /// # Examples
    ///
    /// ```
    /// use depot_core::Category;
    /// use depot_validation::PolicyTable;
    ///
    /// let policy = PolicyTable::default();
    /// assert_eq!(policy.check("image/png", 2048).unwrap(), Category::Images);
    /// assert!(policy.check("video/mp4", 600 * 1024 * 1024).is_err());
    /// ```
    #[instrument(skip(self))]
    pub fn check(&self, mime: &str, size: u64) -> DepotResult<Category> {
        if size == 0 {
            return Err(ValidationError::new(ValidationErrorKind::EmptyFile).into());
        }

        let mime = normalize_mime(mime);
        let category = classify(&mime);
        let policy = self.get(category);

        if !policy.allows(&mime) {
            debug!(%category, "Type not on allow-list");
            return Err(ValidationError::new(ValidationErrorKind::UnsupportedType {
                category: category.to_string(),
                mime_type: mime,
            })
            .into());
        }

        if size > policy.max_bytes {
            debug!(%category, limit = policy.max_bytes, "Upload exceeds size ceiling");
            return Err(ValidationError::new(ValidationErrorKind::FileTooLarge {
                category: category.to_string(),
                size,
                limit: policy.max_bytes,
            })
            .into());
        }

        Ok(category)
    }
}
