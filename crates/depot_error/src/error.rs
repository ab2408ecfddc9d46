//! Top-level error wrapper types.

use crate::{
    AccessError, ConfigError, JsonError, NotFoundError, StorageError, TransformError,
    ValidationError,
};

/// Every error the Depot core can produce.
///
/// # Examples
///
/// ```
/// use depot_error::{DepotError, ValidationError, ValidationErrorKind};
///
/// let err: DepotError = ValidationError::new(ValidationErrorKind::EmptyFile).into();
/// assert!(format!("{}", err).contains("Validation Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum DepotErrorKind {
    /// Bad type, size, or missing input
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Unknown id, missing preset, or expired record
    #[from(NotFoundError)]
    NotFound(NotFoundError),
    /// Codec failure or corrupt source
    #[from(TransformError)]
    Transform(TransformError),
    /// Disk or index I/O failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Caller lacks the rights for the operation
    #[from(AccessError)]
    Access(AccessError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Coarse error classes handed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorCategory {
    /// Request rejected before any side effect
    #[display("validation_failed")]
    Validation,
    /// Resource absent
    #[display("not_found")]
    NotFound,
    /// Caller not allowed
    #[display("access_denied")]
    AccessDenied,
    /// Image transform failed
    #[display("transform_failed")]
    TransformFailed,
    /// Disk or index failure
    #[display("storage_io_failed")]
    StorageIo,
    /// Anything else
    #[display("internal")]
    Internal,
}

/// Depot error with kind discrimination.
///
/// # Examples
///
/// ```
/// use depot_error::{DepotError, DepotResult, ErrorCategory, ConfigError};
///
/// fn might_fail() -> DepotResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::Internal);
/// assert_eq!(err.public_message(), "Internal error");
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Depot Error: {}", _0)]
pub struct DepotError(Box<DepotErrorKind>);

impl DepotError {
    /// Create a new error from a kind.
    pub fn new(kind: DepotErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DepotErrorKind {
        &self.0
    }

    /// Map the error onto the closed set of categories the boundary understands.
    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            DepotErrorKind::Validation(_) => ErrorCategory::Validation,
            DepotErrorKind::NotFound(_) => ErrorCategory::NotFound,
            DepotErrorKind::Access(_) => ErrorCategory::AccessDenied,
            DepotErrorKind::Transform(_) => ErrorCategory::TransformFailed,
            DepotErrorKind::Storage(_) => ErrorCategory::StorageIo,
            DepotErrorKind::Config(_) | DepotErrorKind::Json(_) => ErrorCategory::Internal,
        }
    }

    /// True when the error reports an absent record or preset.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), DepotErrorKind::NotFound(_))
    }

    /// Message safe to return to a caller.
    ///
    /// Validation, not-found and access failures are reported verbatim.
    /// Everything else is reduced to a generic message; the full error is
    /// expected to be logged by whoever calls this.
    pub fn public_message(&self) -> String {
        match self.kind() {
            DepotErrorKind::Validation(e) => e.kind.to_string(),
            DepotErrorKind::NotFound(e) => e.kind.to_string(),
            DepotErrorKind::Access(e) => e.kind.to_string(),
            DepotErrorKind::Transform(_) => "Image transformation failed".to_string(),
            DepotErrorKind::Storage(_) => "Storage operation failed".to_string(),
            DepotErrorKind::Config(_) | DepotErrorKind::Json(_) => "Internal error".to_string(),
        }
    }
}

// Generic From implementation for any type that converts to DepotErrorKind
impl<T> From<T> for DepotError
where
    T: Into<DepotErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Depot operations.
pub type DepotResult<T> = std::result::Result<T, DepotError>;
