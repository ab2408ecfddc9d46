//! Filter, search, sort, paginate.

use crate::{ListQuery, Page, SortKey, SortOrder};
use depot_core::FileRecord;
use std::cmp::Ordering;
use tracing::debug;

/// Run a listing over a set of records.
///
/// The caller decides which records are visible (expiry, access); this
/// function only applies the query. Ties on the sort key are broken by id
/// ascending in both directions, so results are deterministic.
///
/// # Examples
///
/// ```
/// use depot_query::{ListQuery, list};
///
/// let page = list(Vec::new(), &ListQuery::default());
/// assert_eq!(page.total, 0);
/// assert_eq!(page.total_pages, 0);
/// assert!(page.items.is_empty());
/// ```
pub fn list(records: Vec<FileRecord>, query: &ListQuery) -> Page<FileRecord> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<FileRecord> = records
        .into_iter()
        .filter(|r| query.category.matches(r.category))
        .filter(|r| needle.as_deref().is_none_or(|n| matches_search(r, n)))
        .collect();

    matched.sort_by(|a, b| {
        let primary = compare(a, b, query.sort_by);
        let primary = match query.sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });

    let page = query.page.max(1);
    let limit = query.limit.max(1);
    let total = matched.len();
    let total_pages = total.div_ceil(limit);
    let start = (page - 1).saturating_mul(limit);

    let items: Vec<FileRecord> = matched.into_iter().skip(start).take(limit).collect();
    debug!(total, page, limit, returned = items.len(), "Listed records");

    Page {
        items,
        total,
        page,
        limit,
        total_pages,
    }
}

fn matches_search(record: &FileRecord, needle: &str) -> bool {
    record.original_name.to_lowercase().contains(needle)
        || record
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

fn compare(a: &FileRecord, b: &FileRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
        SortKey::Size => a.size.cmp(&b.size),
        SortKey::OriginalName => a
            .original_name
            .to_lowercase()
            .cmp(&b.original_name.to_lowercase()),
        SortKey::Downloads => a.downloads.cmp(&b.downloads),
    }
}
