//! Listing request types.

use depot_core::Category;
use serde::{Deserialize, Serialize};

/// Category restriction of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    /// Every category
    #[default]
    All,
    /// Exactly one category
    #[serde(untagged)]
    Only(Category),
}

impl CategoryFilter {
    /// True when `category` passes the filter.
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(only) => *only == category,
        }
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

/// Field a listing is ordered by.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Creation time
    #[default]
    #[display("uploadedAt")]
    UploadedAt,
    /// Size in bytes
    #[display("size")]
    Size,
    /// Uploader-supplied name, case-insensitive
    #[display("originalName")]
    OriginalName,
    /// Download counter
    #[display("downloads")]
    Downloads,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "").as_str() {
            "uploadedat" | "date" => Ok(SortKey::UploadedAt),
            "size" => Ok(SortKey::Size),
            "originalname" | "name" => Ok(SortKey::OriginalName),
            "downloads" => Ok(SortKey::Downloads),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

/// Direction of the primary sort.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    #[display("asc")]
    Asc,
    /// Largest first
    #[default]
    #[display("desc")]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// One listing request.
///
/// The default lists every category, newest first, 20 per page.
///
/// # Examples
///
/// ```
/// use depot_core::Category;
/// use depot_query::{CategoryFilter, ListQuery, SortKey, SortOrder};
///
/// let query = ListQuery::default()
///     .with_category(CategoryFilter::Only(Category::Images))
///     .with_search("beach")
///     .with_sort_by(SortKey::Size)
///     .with_sort_order(SortOrder::Asc)
///     .with_limit(50);
/// assert_eq!(query.page, 1);
/// assert_eq!(query.search.as_deref(), Some("beach"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[serde(rename_all = "camelCase", default)]
#[setters(prefix = "with_")]
pub struct ListQuery {
    /// Category restriction
    pub category: CategoryFilter,
    /// Case-insensitive substring of the name or any tag
    #[setters(strip_option, into)]
    pub search: Option<String>,
    /// Primary sort key
    pub sort_by: SortKey,
    /// Primary sort direction
    pub sort_order: SortOrder,
    /// 1-indexed page number; 0 is read as 1
    pub page: usize,
    /// Page size; 0 is read as 1
    pub limit: usize,
}

/// Page size used when a caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 20;

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            search: None,
            sort_by: SortKey::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}
