//! Error types for the validation and sanitization engine.
//!
//! Two classes of failure exist and must never be mixed:
//!
//! - [`SchemaError`] - configuration mistakes (malformed schema shapes,
//!   unknown rule or sanitizer names, bad rule parameters). Always fatal
//!   and raised immediately; never collected into a validation result.
//! - [`ValidationError`] - the aggregate of per-field validation messages,
//!   raised only when a [`crate::Validator`] was constructed with
//!   `throw_on_error`. Otherwise validation messages are returned as a
//!   plain `Vec<String>`.
//!
//! Error conversion is automatic via `From` implementations, allowing `?`
//! to work across module boundaries.

use thiserror::Error;

// =============================================================================
// Schema (configuration) errors
// =============================================================================

/// Fatal configuration errors.
///
/// These indicate a mistake in the declarative rule set itself, not in the
/// data being validated.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A descriptor, rule set, or sanitizer set has an unsupported shape.
    #[error("Invalid schema: {0}")]
    InvalidShape(String),

    /// A repeating schema wrapper was not `[schema]`, `[schema, min]` or
    /// `[schema, min, max]`.
    #[error("Sequential array validation must have only one value plus an optional minimum and maximum count value")]
    BadRowBounds,

    /// A rule name resolved to neither a custom-provider rule nor a
    /// built-in library rule.
    #[error("Rule '{rule}' for '{field}' does not exist")]
    UnknownRule { rule: String, field: String },

    /// A sanitizer name resolved to neither a custom-provider sanitizer
    /// nor a built-in library sanitizer.
    #[error("Sanitizer '{sanitizer}' for '{field}' does not exist")]
    UnknownSanitizer { sanitizer: String, field: String },

    /// A string descriptor referenced an abstract fragment that is not in
    /// the fragment table.
    #[error("Abstract fragment '{fragment}' referenced by '{field}' is not defined")]
    MissingFragment { fragment: String, field: String },

    /// A rule parameter did not have the documented shape (for example a
    /// `range` bound that is not a two-element numeric array).
    #[error("Invalid parameter for rule '{rule}': {message}")]
    BadRuleParameter { rule: String, message: String },

    /// A sanitizer parameter did not have the documented shape.
    #[error("Invalid parameter for sanitizer '{sanitizer}': {message}")]
    BadSanitizerParameter { sanitizer: String, message: String },

    /// A dotted subpath did not resolve to an extended sub-schema.
    #[error("Undefined subpath: {0}")]
    UnknownPath(String),
}

// =============================================================================
// Validation errors
// =============================================================================

/// The aggregate of all validation messages for one record.
///
/// Only raised when the validator was constructed with `throw_on_error`;
/// the message joins the ordered per-field errors with `", "`.
#[derive(Debug, Error)]
#[error("{}", .errors.join(", "))]
pub struct ValidationError {
    /// The ordered per-field error messages.
    pub errors: Vec<String>,
}

// =============================================================================
// Loader errors
// =============================================================================

/// Errors while loading schema files from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read a schema file.
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// A schema file did not contain valid JSON.
    #[error("Invalid JSON used for validation rules: {0}")]
    Json(#[from] serde_json::Error),

    /// No schema files were provided.
    #[error("No schema files provided")]
    NoFiles,
}

// =============================================================================
// Top-level error
// =============================================================================

/// Any failure surfaced by the public API.
#[derive(Debug, Error)]
pub enum Error {
    /// Fatal configuration error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Aggregate validation failure (`throw_on_error` mode only).
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Schema file loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

// =============================================================================
// Result type aliases
// =============================================================================

/// Result type for schema parsing and lookup operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for schema file loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for the public validator API.
pub type EngineResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SchemaError -> Error
        let schema_err = SchemaError::UnknownRule {
            rule: "bogus".into(),
            field: "email".into(),
        };
        let err: Error = schema_err.into();
        assert!(err.to_string().contains("bogus"));
        assert!(err.to_string().contains("email"));

        // ValidationError -> Error
        let validation_err = ValidationError {
            errors: vec!["name is required".into(), "Invalid email".into()],
        };
        let err: Error = validation_err.into();
        assert!(err.to_string().contains("name is required, Invalid email"));
    }

    #[test]
    fn test_row_bounds_message() {
        let err = SchemaError::BadRowBounds;
        assert!(err.to_string().contains("minimum and maximum count"));
    }
}
