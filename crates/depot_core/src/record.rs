//! File record types.

use crate::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata describing one stored file.
///
/// The metadata store is the only owner of records. Everything else works
/// on clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Unique short identifier, assigned at creation
    pub id: String,
    /// SHA-256 of the uploaded bytes, the deduplication key
    pub checksum: String,
    /// Name supplied by the uploader
    pub original_name: String,
    /// Sanitized on-disk name
    pub stored_name: String,
    /// Effective MIME type
    pub mime_type: String,
    /// Category derived from the MIME type
    pub category: Category,
    /// Size in bytes
    pub size: u64,
    /// Ordered, duplicate-free tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Pixel width (images only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height (images only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Whether a thumbnail artifact was generated
    #[serde(default)]
    pub thumbnail: bool,
    /// Creation time
    pub uploaded_at: DateTime<Utc>,
    /// Absolute expiry, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Number of content reads
    #[serde(default)]
    pub downloads: u64,
    /// Readable without authentication
    pub is_public: bool,
    /// On-disk location
    pub path: PathBuf,
    /// URL the file is served from
    pub public_url: String,
}

impl FileRecord {
    /// True when the record has an expiry at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// True when the record has already expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// True for records in the images category.
    pub fn is_image(&self) -> bool {
        self.category == Category::Images
    }
}

/// Expiration change carried by a [`FileUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryUpdate {
    /// Expire at an absolute instant
    At(DateTime<Utc>),
    /// Remove the expiry
    Clear,
}

/// Mutable subset of a record. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    /// New public flag
    #[serde(default)]
    pub is_public: Option<bool>,
    /// Replacement tag set
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Expiration change
    #[serde(default)]
    pub expires: Option<ExpiryUpdate>,
}

impl FileUpdate {
    /// True when the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.is_public.is_none() && self.tags.is_none() && self.expires.is_none()
    }

    /// Apply the update to a record in place.
    pub fn apply(&self, record: &mut FileRecord) {
        if let Some(is_public) = self.is_public {
            record.is_public = is_public;
        }
        if let Some(tags) = &self.tags {
            record.tags = normalize_tags(tags.iter().map(String::as_str));
        }
        match self.expires {
            Some(ExpiryUpdate::At(at)) => record.expires_at = Some(at),
            Some(ExpiryUpdate::Clear) => record.expires_at = None,
            None => {}
        }
    }
}

/// Trim tags, drop empties and duplicates, keep first-seen order.
///
/// # Examples
///
/// ```
/// use depot_core::normalize_tags;
///
/// let tags = normalize_tags(["holiday", " beach ", "", "holiday"]);
/// assert_eq!(tags, vec!["holiday", "beach"]);
/// ```
pub fn normalize_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Caller rights resolved by the authentication layer.
///
/// The default is anonymous, public-only access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Access {
    /// Caller presented valid credentials
    pub authenticated: bool,
    /// Caller may run administrative operations
    pub admin: bool,
}

impl Access {
    /// Anonymous caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated, non-admin caller.
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            admin: false,
        }
    }

    /// Authenticated administrator.
    pub fn admin() -> Self {
        Self {
            authenticated: true,
            admin: true,
        }
    }

    /// Whether this caller may read the content of `record`.
    pub fn can_read(&self, record: &FileRecord) -> bool {
        record.is_public || self.authenticated
    }
}
