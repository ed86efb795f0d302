//! Core error types for choicefield.
//!
//! Conversion failures of every kind (bad cast, unknown enumeration value,
//! disallowed null) surface as a single [`ValidationError`] carrying a
//! message and a machine-checkable code. Reading an attribute that was never
//! loaded is a distinct [`OrmError::AttributeError`] and is never folded into
//! validation.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with a message and a short code.
///
/// The codes used by the field layer are `"invalid"` (a value that cannot be
/// cast or that matches no enumeration member), `"null"` (a missing value on
/// a non-nullable column), `"blank"` and `"invalid_choice"`.
///
/// # Examples
///
/// ```
/// use choicefield_core::error::ValidationError;
///
/// let err = ValidationError::new("3 is not a valid Color", "invalid");
/// assert_eq!(err.code, "invalid");
/// assert_eq!(err.to_string(), "3 is not a valid Color");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The human-readable message.
    pub message: String,
    /// A short code identifying the type of validation failure.
    pub code: String,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for choicefield.
#[derive(Error, Debug)]
pub enum OrmError {
    // ── Field values ─────────────────────────────────────────────────

    /// A value failed conversion or validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    /// An attribute was read before any value was loaded or assigned.
    #[error("{0}")]
    AttributeError(String),

    /// A type cannot be used where it was given (e.g. an unsupported
    /// enumeration value type).
    #[error("{0}")]
    TypeError(String),

    /// A field name or lookup path does not resolve on the model.
    #[error("Field does not exist: {0}")]
    FieldDoesNotExist(String),

    // ── Queries ──────────────────────────────────────────────────────

    /// A query expected exactly one result but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A query expected exactly one result but found several.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ── Serialization & configuration ────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrmError {
    /// Returns the wrapped [`ValidationError`], if this is one.
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::ValidationError(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the validation code, if this is a validation error.
    pub fn validation_code(&self) -> Option<&str> {
        self.as_validation().map(|err| err.code.as_str())
    }

    /// Extends an attribute error with the owning model and instance.
    ///
    /// Other variants pass through unchanged.
    #[must_use]
    pub fn on_instance(self, model: &str, instance: &str) -> Self {
        match self {
            Self::AttributeError(message) => {
                Self::AttributeError(format!("{message} on '{model}' instance '{instance}'"))
            }
            other => other,
        }
    }
}

impl From<ValidationError> for OrmError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, OrmError>`.
pub type OrmResult<T> = Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("This field cannot be null.", "null");
        assert_eq!(err.to_string(), "This field cannot be null.");
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("Value 3 is not a valid choice.", "invalid_choice")
            .with_param("value", "3");
        assert_eq!(err.params.get("value").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_orm_error_from_validation() {
        let err: OrmError = ValidationError::new("bad", "invalid").into();
        assert_eq!(err.validation_code(), Some("invalid"));
        assert_eq!(err.to_string(), "Validation error: bad");
    }

    #[test]
    fn test_validation_code_on_other_variants() {
        assert!(OrmError::TypeError("x".into()).validation_code().is_none());
        assert!(OrmError::DoesNotExist("x".into()).as_validation().is_none());
    }

    #[test]
    fn test_attribute_error_on_instance() {
        let err = OrmError::AttributeError("Found no value for 'color'".into())
            .on_instance("Paint", "Paint object (1)");
        assert_eq!(
            err.to_string(),
            "Found no value for 'color' on 'Paint' instance 'Paint object (1)'"
        );
    }

    #[test]
    fn test_on_instance_leaves_other_errors() {
        let err = OrmError::DatabaseError("boom".into()).on_instance("Paint", "x");
        assert_eq!(err.to_string(), "Database error: boom");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: OrmError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }
}
