//! Blob storage and the metadata index for Depot.
//!
//! This crate owns everything Depot keeps on disk apart from derived
//! artifacts:
//!
//! - **Blob storage**: [`FileSystemStorage`] writes uploaded bytes under
//!   `{base}/{category}/{stored_name}` using temp file + rename
//! - **Metadata index**: [`MetadataStore`] is the authoritative set of
//!   [`depot_core::FileRecord`]s, rewritten in full on every mutation
//!
//! # Example
//!
//! ```rust
//! use depot_core::Category;
//! use depot_storage::{BlobStorage, FileSystemStorage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/depot/uploads")?;
//! let path = storage.path_for(Category::Documents, "notes-1a2b.txt");
//!
//! storage.store(&path, b"hello").await?;
//! assert_eq!(storage.retrieve(&path).await?, b"hello");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod metadata;

pub use filesystem::{FileSystemStorage, write_atomic};
pub use metadata::{Lookup, MetadataStore};

use depot_error::DepotResult;
use std::path::Path;

/// Trait for pluggable blob storage backends.
///
/// Implementations hold the bytes of stored files; metadata is kept
/// separately in the [`MetadataStore`].
#[async_trait::async_trait]
pub trait BlobStorage: Send + Sync {
    /// Write `data` to `path`, replacing any existing object atomically.
    ///
    /// Readers observe either the previous object or the complete new one.
    async fn store(&self, path: &Path, data: &[u8]) -> DepotResult<()>;

    /// Read the object at `path`.
    async fn retrieve(&self, path: &Path) -> DepotResult<Vec<u8>>;

    /// Remove the object at `path`.
    async fn delete(&self, path: &Path) -> DepotResult<()>;

    /// Check if an object exists at `path`.
    async fn exists(&self, path: &Path) -> DepotResult<bool>;
}
