//! MIME type to category mapping.

use depot_core::Category;

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/rtf",
    "application/json",
    "application/xml",
    "application/vnd.ms-excel",
    "application/vnd.ms-powerpoint",
];

const DOCUMENT_PREFIXES: &[&str] = &[
    "text/",
    "application/vnd.openxmlformats-officedocument.",
    "application/vnd.oasis.opendocument.",
];

/// Lower-case the type and drop any parameters (`; charset=...`).
///
/// # Examples
///
/// ```
/// use depot_validation::normalize_mime;
///
/// assert_eq!(normalize_mime(" Text/Plain; charset=UTF-8"), "text/plain");
/// ```
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Map a MIME type to its storage category.
///
/// # Examples
///
/// ```
/// use depot_core::Category;
/// use depot_validation::classify;
///
/// assert_eq!(classify("image/png"), Category::Images);
/// assert_eq!(classify("application/pdf"), Category::Documents);
/// assert_eq!(classify("application/zip"), Category::Others);
/// ```
pub fn classify(mime: &str) -> Category {
    let mime = normalize_mime(mime);
    if mime.starts_with("image/") {
        Category::Images
    } else if mime.starts_with("video/") {
        Category::Videos
    } else if mime.starts_with("audio/") {
        Category::Audio
    } else if DOCUMENT_TYPES.contains(&mime.as_str())
        || DOCUMENT_PREFIXES.iter().any(|p| mime.starts_with(p))
    {
        Category::Documents
    } else {
        Category::Others
    }
}
