//! Filename sanitization.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9._-]+").unwrap());
static REPEATED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]{2,}").unwrap());

/// Reduce a filename to a lower-case, path-safe form.
///
/// Characters outside `[a-z0-9._-]` become `-`, runs of separators collapse
/// into one `-`, and leading/trailing separators are stripped. Only used for
/// display and storage paths, never as an identity key.
///
/// # Examples
///
/// ```
/// use depot_validation::sanitize_name;
///
/// assert_eq!(sanitize_name("My Holiday  Photo!!.PNG"), "my-holiday-photo.png");
/// assert_eq!(sanitize_name("../../etc/passwd"), "etc-passwd");
/// assert_eq!(sanitize_name("???"), "file");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = DISALLOWED.replace_all(&lowered, "-");
    let collapsed = REPEATED.replace_all(&replaced, |caps: &regex::Captures<'_>| {
        // a run containing a dot keeps a single dot so extensions survive
        if caps[0].contains('.') {
            ".".to_string()
        } else {
            "-".to_string()
        }
    });
    let trimmed = collapsed.trim_matches(|c| c == '-' || c == '_' || c == '.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lower-case extension of `name`, restricted to ASCII alphanumerics.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|e| !e.is_empty() && e.len() <= 10)
}

/// On-disk name for a record: sanitized stem, id, and lower-case extension.
///
/// # Examples
///
/// ```
/// use depot_validation::stored_name;
///
/// assert_eq!(stored_name("Photo.PNG", "a1b2c3"), "photo-a1b2c3.png");
/// assert_eq!(stored_name("README", "a1b2c3"), "readme-a1b2c3");
/// ```
pub fn stored_name(original: &str, id: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original);
    let stem = sanitize_name(stem);
    match extension_of(original) {
        Some(ext) => format!("{}-{}.{}", stem, id, ext),
        None => format!("{}-{}", stem, id),
    }
}
