//! Canonical name→parameter form for rules and sanitizers.
//!
//! Config accepts three shapes for a `rules` or `sanitizers` entry:
//!
//! - a bare string: `"required"` means `{"required": true}`
//! - a sequence: `["trim", {"max": 30}]` - strings get an implicit `true`
//!   parameter, single-key objects contribute their pair, later entries
//!   overwrite earlier ones of the same name
//! - an object: used as-is
//!
//! All three normalize into a [`RuleSet`] at schema-construction time so
//! the engines never branch on shape again.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};

/// Insertion-ordered canonical mapping of rule (or sanitizer) name to its
/// configured parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    entries: IndexMap<String, Value>,
}

impl RuleSet {
    /// Normalize a raw config value into canonical form.
    ///
    /// `context` names the owning field and entry kind ("rules" or
    /// "sanitizers") for error messages.
    pub fn parse(raw: &Value, context: &str) -> SchemaResult<Self> {
        let mut entries = IndexMap::new();
        match raw {
            Value::String(name) => {
                entries.insert(name.clone(), Value::Bool(true));
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(name) => {
                            entries.insert(name.clone(), Value::Bool(true));
                        }
                        Value::Object(map) if map.len() == 1 => {
                            let (name, param) = map.iter().next().expect("len checked");
                            entries.insert(name.clone(), param.clone());
                        }
                        other => {
                            return Err(SchemaError::InvalidShape(format!(
                                "{context} sequence entries must be names or single-key objects, got {other}"
                            )));
                        }
                    }
                }
            }
            Value::Object(map) => {
                for (name, param) in map {
                    entries.insert(name.clone(), param.clone());
                }
            }
            other => {
                return Err(SchemaError::InvalidShape(format!(
                    "{context} must be a string, sequence, or object, got {other}"
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up the parameter for a name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Whether a name is configured.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Project back into a JSON object, preserving order.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, param) in &self.entries {
            map.insert(name.clone(), param.clone());
        }
        Value::Object(map)
    }
}
