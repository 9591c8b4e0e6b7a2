//! Pluggable custom rules and sanitizers.
//!
//! A [`CustomProvider`] supplies additional named rules and sanitizers and
//! is consulted *before* the built-in libraries, so an application can
//! override a built-in by registering the same name. Provider failures
//! propagate unchanged; the engine never wraps or suppresses them.

use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};

/// External collaborator supplying application-specific rules and
/// sanitizers.
///
/// `rule_names` / `sanitizer_names` are read once at validator
/// construction; the engine then routes matching names to `validate` /
/// `sanitize` instead of the built-in catalogs.
pub trait CustomProvider: Send + Sync {
    /// Names of the rules this provider supports.
    fn rule_names(&self) -> Vec<String>;

    /// Names of the sanitizers this provider supports.
    fn sanitizer_names(&self) -> Vec<String>;

    /// Run a custom rule. Returns `Ok(None)` for valid input, or
    /// `Ok(Some(message))` for a failure. `row` is the full record being
    /// validated, for cross-field rules.
    fn validate(
        &self,
        rule: &str,
        value: &Value,
        param: &Value,
        field: &str,
        row: &serde_json::Map<String, Value>,
    ) -> SchemaResult<Option<String>>;

    /// Run a custom sanitizer, returning the transformed value.
    fn sanitize(&self, sanitizer: &str, value: Value, param: &Value) -> SchemaResult<Value>;
}

impl std::fmt::Debug for dyn CustomProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomProvider")
            .field("rules", &self.rule_names())
            .field("sanitizers", &self.sanitizer_names())
            .finish()
    }
}

/// A provider with no custom entries; useful as a default in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCustoms;

impl CustomProvider for NoCustoms {
    fn rule_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn sanitizer_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn validate(
        &self,
        rule: &str,
        _value: &Value,
        _param: &Value,
        field: &str,
        _row: &serde_json::Map<String, Value>,
    ) -> SchemaResult<Option<String>> {
        Err(SchemaError::UnknownRule {
            rule: rule.to_string(),
            field: field.to_string(),
        })
    }

    fn sanitize(&self, sanitizer: &str, _value: Value, _param: &Value) -> SchemaResult<Value> {
        Err(SchemaError::UnknownSanitizer {
            sanitizer: sanitizer.to_string(),
            field: String::new(),
        })
    }
}
