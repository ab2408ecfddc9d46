//! Not-found error types.

/// What could not be found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NotFoundErrorKind {
    /// No live record with this id (never created, deleted, or expired)
    #[display("File not found: {}", _0)]
    File(String),
    /// Unknown transform preset name
    #[display("Preset not found: {}", _0)]
    Preset(String),
}

/// Not-found error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Not Found: {} at line {} in {}", kind, line, file)]
pub struct NotFoundError {
    /// The kind of error that occurred
    pub kind: NotFoundErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl NotFoundError {
    /// Create a new not-found error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NotFoundErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a missing file record.
    #[track_caller]
    pub fn file(id: impl Into<String>) -> Self {
        Self::new(NotFoundErrorKind::File(id.into()))
    }
}
