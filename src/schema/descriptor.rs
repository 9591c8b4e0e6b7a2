//! Field descriptors and schema parsing.
//!
//! A raw schema is a JSON object mapping field names to descriptors, or a
//! 1-3 element array `[schema, minCount?, maxCount?]` marking the whole
//! input as a repeating array of rows. A descriptor given as a bare string
//! is an alias into the root schema's `abstract` fragment table, resolved
//! at evaluation time so fragments may be defined after their first use.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::ruleset::RuleSet;
use crate::error::{SchemaError, SchemaResult};

/// Row-count bounds for a repeating schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowBounds {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

/// The per-field configuration block.
#[derive(Debug, Clone, Default)]
pub struct FieldDescriptor {
    /// Canonical validation rules.
    pub rules: Option<RuleSet>,
    /// Canonical sanitizers.
    pub sanitizers: Option<RuleSet>,
    /// Per-rule error message overrides.
    pub messages: Option<IndexMap<String, String>>,
    /// Value substituted when the field is absent from input.
    pub default: Option<Value>,
    /// Raw nested sub-schema; child engines are built from it on first
    /// use. `notes` entries are dropped at parse time.
    pub extend: Option<Value>,
}

impl FieldDescriptor {
    /// Parse one descriptor object. Unknown keys are ignored, matching the
    /// permissive config format.
    pub fn parse(name: &str, raw: &serde_json::Map<String, Value>) -> SchemaResult<Self> {
        let rules = raw
            .get("rules")
            .map(|r| RuleSet::parse(r, &format!("'{name}' rules")))
            .transpose()?;
        let sanitizers = raw
            .get("sanitizers")
            .map(|s| RuleSet::parse(s, &format!("'{name}' sanitizers")))
            .transpose()?;

        let messages = match raw.get("message") {
            None => None,
            Some(Value::Object(map)) => {
                let mut out = IndexMap::new();
                for (rule, text) in map {
                    match text.as_str() {
                        Some(t) => {
                            out.insert(rule.clone(), t.to_string());
                        }
                        None => {
                            return Err(SchemaError::InvalidShape(format!(
                                "'{name}' message for rule '{rule}' must be a string"
                            )));
                        }
                    }
                }
                Some(out)
            }
            Some(other) => {
                return Err(SchemaError::InvalidShape(format!(
                    "'{name}' message must be an object of rule name to text, got {other}"
                )));
            }
        };

        let extend = match raw.get("extend") {
            None => None,
            Some(e) => {
                // Validate the wrapper shape eagerly so a malformed extend
                // fails at construction, not on first use.
                unwrap_bounds(e)?;
                Some(e.clone())
            }
        };

        Ok(Self {
            rules,
            sanitizers,
            messages,
            default: raw.get("default").cloned(),
            extend,
        })
    }
}

/// A schema entry: either an inline descriptor or an unresolved alias into
/// the abstract-fragment table.
#[derive(Debug, Clone)]
pub enum FieldSpec {
    Alias(String),
    Descriptor(Box<FieldDescriptor>),
}

/// Named reusable descriptors shared by reference with every child engine.
pub type FragmentTable = IndexMap<String, FieldDescriptor>;

/// A parsed, canonical schema.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Field name to spec, in declaration order.
    pub fields: IndexMap<String, FieldSpec>,
    /// Abstract fragments, shared with descendants.
    pub fragments: Arc<FragmentTable>,
    /// Present when the schema validates a repeating array of rows.
    pub bounds: Option<RowBounds>,
}

impl Schema {
    /// Parse a raw schema with no inherited fragments.
    pub fn parse(raw: &Value) -> SchemaResult<Self> {
        Self::parse_with_fragments(raw, None)
    }

    /// Parse a raw schema, merging its own `abstract` table over an
    /// inherited one (the child's definitions win).
    pub fn parse_with_fragments(
        raw: &Value,
        inherited: Option<&Arc<FragmentTable>>,
    ) -> SchemaResult<Self> {
        let (object, bounds) = unwrap_bounds(raw)?;

        let mut fragments: FragmentTable = inherited
            .map(|table| table.as_ref().clone())
            .unwrap_or_default();
        if let Some(raw_fragments) = object.get("abstract") {
            let table = raw_fragments.as_object().ok_or_else(|| {
                SchemaError::InvalidShape(format!(
                    "'abstract' must be an object of named descriptors, got {raw_fragments}"
                ))
            })?;
            for (name, fragment) in table {
                let map = fragment.as_object().ok_or_else(|| {
                    SchemaError::InvalidShape(format!(
                        "abstract fragment '{name}' must be a descriptor object"
                    ))
                })?;
                fragments.insert(name.clone(), FieldDescriptor::parse(name, map)?);
            }
        }

        let mut fields = IndexMap::new();
        for (name, entry) in object {
            if name == "abstract" {
                continue;
            }
            let spec = match entry {
                Value::String(alias) => FieldSpec::Alias(alias.clone()),
                Value::Object(map) => {
                    FieldSpec::Descriptor(Box::new(FieldDescriptor::parse(name, map)?))
                }
                other => {
                    return Err(SchemaError::InvalidShape(format!(
                        "field '{name}' must be a descriptor object or fragment alias, got {other}"
                    )));
                }
            };
            fields.insert(name.clone(), spec);
        }

        Ok(Self {
            fields,
            fragments: Arc::new(fragments),
            bounds,
        })
    }

    /// Whether this schema applies to each element of an array input.
    pub fn is_repeating(&self) -> bool {
        self.bounds.is_some()
    }

    /// Resolve a field spec, looking aliases up in the fragment table.
    pub fn resolve<'a>(&'a self, name: &str, spec: &'a FieldSpec) -> SchemaResult<&'a FieldDescriptor> {
        match spec {
            FieldSpec::Descriptor(descriptor) => Ok(descriptor),
            FieldSpec::Alias(alias) => {
                self.fragments
                    .get(alias)
                    .ok_or_else(|| SchemaError::MissingFragment {
                        fragment: alias.clone(),
                        field: name.to_string(),
                    })
            }
        }
    }
}

/// Split a raw schema into its object part and optional repeating bounds.
///
/// A sequence wrapper must have 1-3 elements: the object schema, then
/// optional minimum and maximum row counts.
pub fn unwrap_bounds(raw: &Value) -> SchemaResult<(&serde_json::Map<String, Value>, Option<RowBounds>)> {
    match raw {
        Value::Object(map) => Ok((map, None)),
        Value::Array(items) => {
            if items.is_empty() || items.len() > 3 {
                return Err(SchemaError::BadRowBounds);
            }
            let object = items[0].as_object().ok_or(SchemaError::BadRowBounds)?;
            let mut bounds = RowBounds::default();
            if let Some(min) = items.get(1) {
                if !min.is_null() {
                    bounds.min = Some(min.as_u64().ok_or_else(|| {
                        SchemaError::InvalidShape("minimum row count must be a number".into())
                    })?);
                }
            }
            if let Some(max) = items.get(2) {
                if !max.is_null() {
                    bounds.max = Some(max.as_u64().ok_or_else(|| {
                        SchemaError::InvalidShape("maximum row count must be a number".into())
                    })?);
                }
            }
            Ok((object, Some(bounds)))
        }
        other => Err(SchemaError::InvalidShape(format!(
            "schema must be an object or a [schema, min, max] sequence, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_schema() {
        let schema = Schema::parse(&json!({
            "email": {"rules": {"required": true, "email": true}},
            "name": {"rules": "required", "sanitizers": "trim"}
        }))
        .unwrap();
        assert!(!schema.is_repeating());
        let names: Vec<&String> = schema.fields.keys().collect();
        assert_eq!(names, vec!["email", "name"]);
    }

    #[test]
    fn test_parse_repeating_with_bounds() {
        let schema = Schema::parse(&json!([{"id": {"rules": "required"}}, 2, 4])).unwrap();
        assert_eq!(
            schema.bounds,
            Some(RowBounds {
                min: Some(2),
                max: Some(4)
            })
        );
    }

    #[test]
    fn test_bad_wrapper_lengths() {
        assert!(matches!(
            Schema::parse(&json!([])),
            Err(SchemaError::BadRowBounds)
        ));
        assert!(matches!(
            Schema::parse(&json!([{}, 1, 2, 3])),
            Err(SchemaError::BadRowBounds)
        ));
    }

    #[test]
    fn test_abstract_extraction_and_alias() {
        let schema = Schema::parse(&json!({
            "abstract": {"id": {"rules": {"required": true, "digits": true}}},
            "userId": "id",
            "groupId": "id"
        }))
        .unwrap();
        assert!(!schema.fields.contains_key("abstract"));
        let spec = schema.fields.get("userId").unwrap();
        let descriptor = schema.resolve("userId", spec).unwrap();
        assert!(descriptor.rules.as_ref().unwrap().contains("digits"));
    }

    #[test]
    fn test_missing_fragment_is_config_error() {
        let schema = Schema::parse(&json!({"userId": "nope"})).unwrap();
        let spec = schema.fields.get("userId").unwrap();
        assert!(matches!(
            schema.resolve("userId", spec),
            Err(SchemaError::MissingFragment { .. })
        ));
    }

    #[test]
    fn test_inherited_fragments_merge() {
        let parent = Schema::parse(&json!({
            "abstract": {"id": {"rules": "digits"}},
            "x": {}
        }))
        .unwrap();
        let child = Schema::parse_with_fragments(
            &json!({"abstract": {"name": {"rules": "required"}}, "y": "id"}),
            Some(&parent.fragments),
        )
        .unwrap();
        assert!(child.fragments.contains_key("id"));
        assert!(child.fragments.contains_key("name"));
    }

    #[test]
    fn test_malformed_extend_rejected_eagerly() {
        let result = Schema::parse(&json!({
            "rows": {"extend": [{"a": {}}, 1, 2, 3]}
        }));
        assert!(matches!(result, Err(SchemaError::BadRowBounds)));
    }

    #[test]
    fn test_notes_are_ignored() {
        let schema = Schema::parse(&json!({
            "a": {"notes": "free text", "rules": "required"}
        }))
        .unwrap();
        let descriptor = schema
            .resolve("a", schema.fields.get("a").unwrap())
            .unwrap();
        assert!(descriptor.rules.is_some());
    }
}
