//! Derived image artifacts for Depot.
//!
//! [`ArtifactCache`] maps `(file id, transform descriptor, encoding)` to
//! encoded bytes on disk, computing each artifact at most once. The
//! [`imaging`] functions do the actual pixel work and are also used directly
//! for upload-time dimension extraction and resizing.
//!
//! # Example
//!
//! ```rust,no_run
//! use depot_cache::ArtifactCache;
//! use depot_core::preset;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ArtifactCache::new("/var/depot/cache")?;
//! let thumbnail = preset("thumbnail").unwrap();
//! let source = Path::new("/var/depot/uploads/images/photo.png");
//!
//! let artifact = cache
//!     .get("3f9c1a7e52b04d11", source, "image/png", &thumbnail)
//!     .await?;
//! assert_eq!(artifact.content_type(), "image/jpeg");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
pub mod imaging;

pub use cache::{Artifact, ArtifactCache};
