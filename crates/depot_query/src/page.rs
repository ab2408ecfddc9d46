//! Paginated results.

use serde::{Deserialize, Serialize};

/// One page of a listing, with enough context to fetch the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Matching items across all pages
    pub total: usize,
    /// 1-indexed page number
    pub page: usize,
    /// Page size
    pub limit: usize,
    /// `ceil(total / limit)`
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Transform the items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }

    /// True when this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
