//! The sanitization pass.
//!
//! Produces a cleaned record from canonical descriptors: only fields with
//! a sanitizer or a default make it into the output, except that rule-only
//! fields pass their raw input value through so sanitize-then-validate
//! pipelines never drop data.

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{SanitizeOptions, Validator};
use crate::error::{EngineResult, SchemaError, SchemaResult};
use crate::sanitizers;

impl Validator {
    /// Sanitize a record, returning the cleaned copy.
    pub fn sanitize(&self, data: &Value) -> EngineResult<Value> {
        self.sanitize_with(data, &SanitizeOptions::default())
    }

    /// Sanitize with an allow-list and/or suppressed default-filling.
    pub fn sanitize_with(&self, data: &Value, options: &SanitizeOptions) -> EngineResult<Value> {
        Ok(self.sanitize_collect(data, options)?)
    }

    /// Sanitize a single name/value pair, returning the cleaned value -
    /// `Null` when the field has neither a sanitizer, a default, nor a
    /// rule.
    pub fn sanitize_field(&self, name: &str, value: &Value) -> EngineResult<Value> {
        let mut record = serde_json::Map::new();
        record.insert(name.to_string(), value.clone());
        let cleaned = self.sanitize_collect(
            &Value::Object(record),
            &SanitizeOptions {
                only: Some(vec![name.to_string()]),
                include_defaults: true,
            },
        )?;
        Ok(cleaned.get(name).cloned().unwrap_or(Value::Null))
    }

    pub(crate) fn sanitize_collect(
        &self,
        data: &Value,
        options: &SanitizeOptions,
    ) -> SchemaResult<Value> {
        let cleaned = if self.schema().bounds.is_some() {
            match data.as_array() {
                Some(rows) => {
                    let mut out = Vec::with_capacity(rows.len());
                    for row in rows {
                        match row.as_object() {
                            Some(object) => {
                                out.push(Value::Object(self.sanitize_row(object, options)?));
                            }
                            // A malformed row is input data, not config;
                            // leave it for validation to report.
                            None => out.push(row.clone()),
                        }
                    }
                    Value::Array(out)
                }
                None => {
                    warn!("repeating schema given non-array input, returning it unchanged");
                    data.clone()
                }
            }
        } else {
            match data.as_object() {
                Some(object) => Value::Object(self.sanitize_row(object, options)?),
                None => {
                    warn!("object schema given non-object input, returning it unchanged");
                    data.clone()
                }
            }
        };
        debug!("sanitization pass complete");
        Ok(cleaned)
    }

    fn sanitize_row(
        &self,
        row: &serde_json::Map<String, Value>,
        options: &SanitizeOptions,
    ) -> SchemaResult<serde_json::Map<String, Value>> {
        let mut out = serde_json::Map::new();

        for name in self.field_names(options.only.as_deref()) {
            let Some(descriptor) = self.descriptor(name)? else {
                continue;
            };
            let present = row.contains_key(name);
            let has_sanitizers = descriptor.sanitizers.is_some();
            let has_default = descriptor.default.is_some();

            if (has_sanitizers || has_default) && (present || options.include_defaults) {
                let mut value = row
                    .get(name)
                    .cloned()
                    .or_else(|| descriptor.default.clone())
                    .or_else(|| {
                        // Library-wide fallback: an absent multi-select
                        // sanitizes to an empty list instead of null.
                        descriptor
                            .sanitizers
                            .as_ref()?
                            .iter()
                            .find_map(|(sanitizer, _)| sanitizers::absent_fallback(sanitizer))
                    })
                    .unwrap_or(Value::Null);

                if let Some(sanitizer_set) = &descriptor.sanitizers {
                    for (sanitizer, param) in sanitizer_set.iter() {
                        value = self.apply_sanitizer(sanitizer, value, param, name)?;
                    }
                }
                out.insert(name.to_string(), value);
            } else if descriptor.rules.is_some() && present {
                // Rule-only fields pass through untouched so a
                // sanitize+validate pipeline keeps them.
                out.insert(
                    name.to_string(),
                    row.get(name).cloned().unwrap_or(Value::Null),
                );
            }

            if let Some(extend) = &descriptor.extend {
                if let Some(current) = out.get(name).cloned() {
                    let child = self.child(name, extend)?;
                    let sub_value = if current.is_null() {
                        if child.is_repeating() {
                            json!([])
                        } else {
                            json!({})
                        }
                    } else {
                        current
                    };
                    let cleaned = child.sanitize_collect(
                        &sub_value,
                        &SanitizeOptions {
                            only: None,
                            include_defaults: options.include_defaults,
                        },
                    )?;
                    out.insert(name.to_string(), cleaned);
                }
            }
        }
        Ok(out)
    }

    /// Run one sanitizer: the custom provider wins over the built-in
    /// library, and a name known to neither is a configuration error.
    fn apply_sanitizer(
        &self,
        sanitizer: &str,
        value: Value,
        param: &Value,
        field: &str,
    ) -> SchemaResult<Value> {
        if self.has_custom_sanitizer(sanitizer) {
            if let Some(provider) = self.provider() {
                return provider.sanitize(sanitizer, value, param);
            }
        }
        match sanitizers::lookup(sanitizer) {
            Some(f) => f(value, param),
            None => Err(SchemaError::UnknownSanitizer {
                sanitizer: sanitizer.to_string(),
                field: field.to_string(),
            }),
        }
    }
}
