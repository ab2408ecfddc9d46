//! Results returned by the file service.

use depot_core::{Category, FileRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// The stored record, or the existing one for duplicate content
    pub record: FileRecord,
    /// True when the content was already stored and nothing was written
    pub deduplicated: bool,
    /// Derived-data steps that failed without failing the upload
    pub warnings: Vec<String>,
}

/// What a delete managed to clean up.
///
/// The record is always gone when a report is returned; disk and cache
/// failures are reported here instead of failing the delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    /// The removed record
    pub record: FileRecord,
    /// True when the stored object was removed
    pub object_removed: bool,
    /// Why the stored object could not be removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_error: Option<String>,
    /// Number of derived artifacts removed
    pub artifacts_purged: usize,
    /// Why the artifacts could not be removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_error: Option<String>,
}

impl DeleteReport {
    /// True when every cleanup step succeeded.
    pub fn is_clean(&self) -> bool {
        self.object_error.is_none() && self.cache_error.is_none()
    }
}

/// Content of a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// Stored bytes
    pub bytes: Vec<u8>,
    /// MIME type to serve the bytes with
    pub mime_type: String,
    /// Record after the download was counted
    pub record: FileRecord,
}

/// Result of a transform request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub content_type: String,
    /// Served from the artifact cache
    pub cache_hit: bool,
    /// Original bytes returned because the file is not a transformable image
    pub passthrough: bool,
}

/// Totals for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    /// Live records
    pub files: usize,
    /// Their combined size
    pub bytes: u64,
}

/// Storage totals over live records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Live records
    pub total_files: usize,
    /// Combined size of live records
    pub total_bytes: u64,
    /// Sum of download counters
    pub total_downloads: u64,
    /// Per-category breakdown; categories without files are omitted
    pub by_category: BTreeMap<Category, CategoryStats>,
}

impl Stats {
    /// Fold records into totals.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a FileRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total_files += 1;
            stats.total_bytes += record.size;
            stats.total_downloads += record.downloads;
            let entry = stats.by_category.entry(record.category).or_default();
            entry.files += 1;
            entry.bytes += record.size;
        }
        stats
    }
}
