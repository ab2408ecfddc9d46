//! Validation error types.
//!
//! Validation failures are raised before any side effect and are safe to
//! show to the caller verbatim.

/// Specific validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Upload carried no bytes
    #[display("File is empty")]
    EmptyFile,

    /// Upload exceeds the category size ceiling
    #[display("File too large for {}: {} bytes exceeds limit of {} bytes", category, size, limit)]
    FileTooLarge {
        /// Category the file was classified into
        category: String,
        /// Size of the upload in bytes
        size: u64,
        /// Configured ceiling in bytes
        limit: u64,
    },

    /// MIME type is not on the category allow-list
    #[display("File type '{}' is not allowed for {}", mime_type, category)]
    UnsupportedType {
        /// Category the file was classified into
        category: String,
        /// Effective MIME type of the upload
        mime_type: String,
    },

    /// A request parameter could not be interpreted
    #[display("Invalid parameter '{}': {}", name, reason)]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A required input was absent
    #[display("Missing required input: {}", _0)]
    MissingInput(String),
}

/// Validation error with location tracking.
///
/// # Examples
///
/// ```
/// use depot_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::EmptyFile);
/// assert!(format!("{}", err).contains("empty"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The kind of error that occurred
    pub kind: ValidationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new validation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for an [`ValidationErrorKind::InvalidParameter`] error.
    #[track_caller]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        })
    }
}
