//! Listing engine for Depot.
//!
//! [`list`] applies a [`ListQuery`] (category filter, search, sort,
//! pagination) to a snapshot of records and returns a [`Page`]. It is a
//! pure function over its input; visibility rules such as expiry and
//! public/private access are applied by the caller before the snapshot is
//! handed over.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod page;
mod query;

pub use engine::list;
pub use page::Page;
pub use query::{CategoryFilter, DEFAULT_LIMIT, ListQuery, SortKey, SortOrder};
