//! Error types for the Depot file storage service.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! The routing layer never sees these types directly. It asks a
//! [`DepotError`] for its [`ErrorCategory`] and maps that to a transport
//! response.
//!
//! # Examples
//!
//! ```
//! use depot_error::{DepotResult, ErrorCategory, NotFoundError, NotFoundErrorKind};
//!
//! fn lookup(id: &str) -> DepotResult<String> {
//!     Err(NotFoundError::new(NotFoundErrorKind::File(id.to_string())))?
//! }
//!
//! let err = lookup("abc123").unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::NotFound);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod access;
mod config;
mod error;
mod json;
mod not_found;
mod storage;
mod transform;
mod validation;

pub use access::{AccessError, AccessErrorKind};
pub use config::ConfigError;
pub use error::{DepotError, DepotErrorKind, DepotResult, ErrorCategory};
pub use json::JsonError;
pub use not_found::{NotFoundError, NotFoundErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use transform::{TransformError, TransformErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};
