//! Client schema export.
//!
//! Projects canonical descriptors into the `{rules, messages}` structure a
//! browser-side validation library consumes. Server-only rules are
//! stripped, client-only wrappers are unwrapped to their inner value, and
//! `extend` sub-schemas export recursively under their field name (wrapped
//! in a one-element array when the extend is repeating). Nothing here
//! evaluates data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::Validator;
use crate::error::{EngineResult, LoadError, SchemaResult};

/// The exported client-side configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSchema {
    /// Field name to its client-visible rules.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub rules: serde_json::Map<String, Value>,
    /// Field name to its per-rule message overrides.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub messages: serde_json::Map<String, Value>,
    /// Nested exports for `extend` fields, keyed by field name.
    #[serde(flatten)]
    pub nested: serde_json::Map<String, Value>,
}

impl ClientSchema {
    /// Project into a plain JSON value.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, sub) in &self.nested {
            map.insert(name.clone(), sub.clone());
        }
        if !self.rules.is_empty() {
            map.insert("rules".to_string(), Value::Object(self.rules.clone()));
        }
        if !self.messages.is_empty() {
            map.insert("messages".to_string(), Value::Object(self.messages.clone()));
        }
        Value::Object(map)
    }
}

impl Validator {
    /// Export the client-side schema, optionally for a dotted `extend`
    /// subpath.
    pub fn client_schema(&self, subpath: Option<&str>) -> EngineResult<ClientSchema> {
        match subpath {
            Some(path) => Ok(self.subvalidator(path)?.export_schema()?),
            None => Ok(self.export_schema()?),
        }
    }

    /// Export the client-side schema as a JSON string.
    pub fn client_schema_json(&self, subpath: Option<&str>) -> EngineResult<String> {
        let schema = self.client_schema(subpath)?;
        serde_json::to_string(&schema).map_err(|e| LoadError::Json(e).into())
    }

    fn export_schema(&self) -> SchemaResult<ClientSchema> {
        let mut out = ClientSchema::default();

        for (name, spec) in &self.schema().fields {
            let descriptor = self.schema().resolve(name, spec)?;

            if let Some(extend) = &descriptor.extend {
                let child = self.child(name, extend)?;
                let sub = child.export_schema()?.to_value();
                let wrapped = if child.is_repeating() {
                    Value::Array(vec![sub])
                } else {
                    sub
                };
                out.nested.insert(name.clone(), wrapped);
                continue;
            }

            if let Some(rule_set) = &descriptor.rules {
                if let Some(inner) = rule_set.get("clientOnly") {
                    out.rules.insert(name.clone(), inner.clone());
                } else {
                    let mut visible = serde_json::Map::new();
                    for (rule, param) in rule_set.iter() {
                        if rule != "serverOnly" {
                            visible.insert(rule.to_string(), param.clone());
                        }
                    }
                    if !visible.is_empty() {
                        out.rules.insert(name.clone(), Value::Object(visible));
                    }
                }
            }

            if let Some(overrides) = &descriptor.messages {
                let mut map = serde_json::Map::new();
                for (rule, text) in overrides {
                    map.insert(rule.clone(), Value::String(text.clone()));
                }
                out.messages.insert(name.clone(), Value::Object(map));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator(schema: Value) -> Validator {
        Validator::new(schema, None, false).unwrap()
    }

    #[test]
    fn test_basic_export() {
        let v = validator(json!({
            "email": {
                "rules": {"required": true, "email": true},
                "message": {"email": "That address looks wrong"},
                "notes": "ignored"
            },
            "age": {"sanitizers": "int"}
        }));
        let schema = v.client_schema(None).unwrap();
        assert_eq!(
            schema.to_value(),
            json!({
                "rules": {"email": {"required": true, "email": true}},
                "messages": {"email": {"email": "That address looks wrong"}}
            })
        );
    }

    #[test]
    fn test_server_only_is_stripped() {
        let v = validator(json!({
            "token": {"rules": {"serverOnly": "digits"}},
            "name": {"rules": {"required": true, "serverOnly": "noInvalid"}}
        }));
        let schema = v.client_schema(None).unwrap();
        // A field whose only rule is serverOnly disappears entirely.
        assert!(!schema.rules.contains_key("token"));
        assert_eq!(schema.rules["name"], json!({"required": true}));
    }

    #[test]
    fn test_client_only_is_unwrapped() {
        let v = validator(json!({
            "lookup": {"rules": {"clientOnly": {"remote": "/check"}, "required": true}}
        }));
        let schema = v.client_schema(None).unwrap();
        assert_eq!(schema.rules["lookup"], json!({"remote": "/check"}));
    }

    #[test]
    fn test_extend_exports_nested() {
        let v = validator(json!({
            "address": {
                "extend": {
                    "zip": {"rules": {"required": true, "digits": true}}
                }
            },
            "lines": {
                "extend": [{"sku": {"rules": "required"}}, 1]
            }
        }));
        let value = v.client_schema(None).unwrap().to_value();
        assert_eq!(
            value["address"],
            json!({"rules": {"zip": {"required": true, "digits": true}}})
        );
        // Repeating extends wrap in a one-element array.
        assert_eq!(value["lines"], json!([{"rules": {"sku": {"required": true}}}]));
    }

    #[test]
    fn test_subpath_export() {
        let v = validator(json!({
            "address": {
                "extend": {
                    "zip": {"rules": "required"}
                }
            }
        }));
        let sub = v.client_schema(Some("address")).unwrap();
        assert_eq!(sub.to_value(), json!({"rules": {"zip": {"required": true}}}));
    }

    #[test]
    fn test_json_string_round_trips() {
        let v = validator(json!({
            "email": {"rules": {"required": true}}
        }));
        let text = v.client_schema_json(None).unwrap();
        let parsed: ClientSchema = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, v.client_schema(None).unwrap());
    }

    #[test]
    fn test_aliases_export_their_fragment_rules() {
        let v = validator(json!({
            "abstract": {"id": {"rules": {"required": true, "digits": true}}},
            "userId": "id"
        }));
        let schema = v.client_schema(None).unwrap();
        assert_eq!(schema.rules["userId"], json!({"required": true, "digits": true}));
    }
}
