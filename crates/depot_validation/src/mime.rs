//! Effective MIME type resolution.

use crate::{extension_of, normalize_mime};
use tracing::debug;

/// Generic binary type used when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("avif", "image/avif"),
    ("ico", "image/x-icon"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("rtf", "application/rtf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("mpeg", "video/mpeg"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("aac", "audio/aac"),
    ("flac", "audio/flac"),
    ("m4a", "audio/x-m4a"),
    ("zip", "application/zip"),
];

/// MIME type for a filename's extension, if known.
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = extension_of(name)?;
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// True for `type/subtype` strings made of MIME token characters.
pub fn is_well_formed(mime: &str) -> bool {
    let Some((kind, subtype)) = mime.split_once('/') else {
        return false;
    };
    let token = |c: char| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c);
    !kind.is_empty() && !subtype.is_empty() && kind.chars().all(token) && subtype.chars().all(token)
}

/// Decide the effective MIME type of an upload.
///
/// Order: the declared type when it is specific, then the filename
/// extension, then magic-byte sniffing, then `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use depot_validation::resolve_mime;
///
/// assert_eq!(resolve_mime(Some("image/png"), "x.bin", b"..."), "image/png");
/// assert_eq!(resolve_mime(None, "notes.TXT", b"hello"), "text/plain");
/// let octets = resolve_mime(Some("application/octet-stream"), "blob", b"\0\0");
/// assert_eq!(octets, "application/octet-stream");
/// ```
pub fn resolve_mime(declared: Option<&str>, name: &str, data: &[u8]) -> String {
    if let Some(declared) = declared.map(normalize_mime)
        && is_well_formed(&declared)
        && declared != OCTET_STREAM
    {
        return declared;
    }

    if let Some(mime) = mime_from_extension(name) {
        debug!(mime, "Resolved MIME type from extension");
        return mime.to_string();
    }

    if let Some(kind) = infer::get(data) {
        debug!(mime = kind.mime_type(), "Resolved MIME type from content");
        return kind.mime_type().to_string();
    }

    OCTET_STREAM.to_string()
}
