//! Transform error types.

/// Kinds of image transform failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TransformErrorKind {
    /// Source bytes could not be decoded as an image
    #[display("Failed to decode source image: {}", _0)]
    Decode(String),
    /// Output could not be encoded
    #[display("Failed to encode output image: {}", _0)]
    Encode(String),
    /// Source or target format is not supported
    #[display("Unsupported image format: {}", _0)]
    UnsupportedFormat(String),
    /// The blocking transform task did not complete
    #[display("Transform task failed: {}", _0)]
    Task(String),
}

/// Transform error with location tracking.
///
/// # Examples
///
/// ```
/// use depot_error::{TransformError, TransformErrorKind};
///
/// let err = TransformError::new(TransformErrorKind::Decode("truncated".to_string()));
/// assert!(format!("{}", err).contains("decode"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transform Error: {} at line {} in {}", kind, line, file)]
pub struct TransformError {
    /// The kind of error that occurred
    pub kind: TransformErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TransformError {
    /// Create a new transform error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransformErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
