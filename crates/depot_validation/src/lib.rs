//! Upload classification and policy checks for Depot.
//!
//! Everything in this crate is a pure function: no I/O, no shared state.
//! The lifecycle manager runs these checks before touching the disk.
//!
//! - [`classify`] maps a MIME type onto a [`depot_core::Category`]
//! - [`PolicyTable`] enforces per-category size ceilings and type allow-lists
//! - [`sanitize_name`] and [`stored_name`] produce path-safe names
//! - [`content_hash`] computes the deduplication checksum
//! - [`resolve_mime`] decides the effective MIME type of an upload

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classify;
mod hash;
mod mime;
mod policy;
mod sanitize;

pub use classify::{classify, normalize_mime};
pub use hash::content_hash;
pub use mime::{OCTET_STREAM, is_well_formed, mime_from_extension, resolve_mime};
pub use policy::{CategoryPolicy, PolicyTable};
pub use sanitize::{extension_of, sanitize_name, stored_name};
