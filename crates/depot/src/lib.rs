//! Depot: file storage with metadata indexing, listing and cached image
//! transforms.
//!
//! # Features
//!
//! - **Validated uploads**: MIME resolution, per-category size and type
//!   policy, content-hash deduplication
//! - **Durable metadata**: a JSON index rewritten atomically on every change
//! - **Listings**: category filter, search, sort and pagination
//! - **Derived images**: CDN-style transforms and presets, computed once
//!   and cached on disk
//! - **Lifecycle**: expiry with lazy eviction and an admin sweep
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use depot::{DepotConfig, FileService, UploadOptions, UploadRequest};
//! use depot_core::Access;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = FileService::new(DepotConfig::load()?).await?;
//!
//!     let request = UploadRequest::new(std::fs::read("photo.png")?, "photo.png")
//!         .with_options(UploadOptions::default().with_tags(vec!["holiday".into()]));
//!     let outcome = service.upload(request).await?;
//!
//!     let thumb = service
//!         .transform(&outcome.record.id, Access::anonymous(), Some("thumbnail"), &[])
//!         .await?;
//!     println!("{} bytes of {}", thumb.bytes.len(), thumb.content_type);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `depot_error` - Error types
//! - `depot_core` - Records, categories, transform descriptors, presets
//! - `depot_validation` - Classification, policy, name sanitizing, hashing
//! - `depot_storage` - Blob storage and the metadata index
//! - `depot_cache` - Image pipeline and artifact cache
//! - `depot_query` - Listing engine
//!
//! This crate ties them together in [`FileService`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod ids;
mod observability;
mod outcome;
mod request;
mod service;

pub use config::{DepotConfig, QueryConfig, StorageConfig, ThumbnailConfig};
pub use observability::{ObservabilityConfig, init_observability};
pub use outcome::{CategoryStats, Content, DeleteReport, Stats, Transformed, UploadOutcome};
pub use request::{UploadOptions, UploadRequest};
pub use service::FileService;

pub use depot_core::{
    Access, Category, ExpiryUpdate, FileRecord, FileUpdate, Fit, OutputFormat,
    TransformDescriptor, presets,
};
pub use depot_error::{DepotError, DepotErrorKind, DepotResult, ErrorCategory};
pub use depot_query::{CategoryFilter, ListQuery, Page, SortKey, SortOrder};
