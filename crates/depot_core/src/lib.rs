//! Core data types for the Depot file storage service.
//!
//! This crate provides the types shared by every Depot component:
//! - [`FileRecord`] and [`FileUpdate`], the metadata model
//! - [`Category`], the closed set of storage categories
//! - [`TransformDescriptor`] and the named preset table
//! - [`Access`], the resolved caller rights
//! - [`KeyedLocks`], per-key async shared and exclusive locking

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod locks;
mod preset;
mod record;
mod transform;

pub use category::Category;
pub use locks::{KeyedGuard, KeyedLocks};
pub use preset::{PRESET_NAMES, THUMBNAIL_PRESET, preset, presets, resolve_descriptor};
pub use record::{Access, ExpiryUpdate, FileRecord, FileUpdate, normalize_tags};
pub use transform::{DEFAULT_QUALITY, Fit, MAX_BLUR, OutputFormat, TransformDescriptor};
