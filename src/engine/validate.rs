//! The validation pass.
//!
//! Walks canonical descriptors against an input record, collecting
//! human-readable error strings in schema order. All fields are always
//! evaluated - an early failure never short-circuits later fields - so
//! two runs over identical input produce identical error lists.

use serde_json::{json, Value};
use tracing::debug;

use super::{ValidateOptions, Validator};
use crate::error::{EngineResult, SchemaError, SchemaResult, ValidationError};
use crate::rules::{self, RowContext};

impl Validator {
    /// Validate a record, returning the ordered error list - or raising
    /// the aggregate [`ValidationError`] when this validator was built
    /// with `throw_on_error`.
    pub fn validate(&self, data: &Value) -> EngineResult<Vec<String>> {
        self.validate_with(data, &ValidateOptions::default())
    }

    /// Validate with an allow-list and/or PATCH-style absence handling.
    pub fn validate_with(
        &self,
        data: &Value,
        options: &ValidateOptions,
    ) -> EngineResult<Vec<String>> {
        let errors = self.validate_collect(data, options)?;
        if self.throws_on_error() && !errors.is_empty() {
            return Err(ValidationError { errors }.into());
        }
        Ok(errors)
    }

    /// Validate a single name/value pair against its field descriptor.
    pub fn validate_field(&self, name: &str, value: &Value) -> EngineResult<Vec<String>> {
        let mut record = serde_json::Map::new();
        record.insert(name.to_string(), value.clone());
        self.validate_with(
            &Value::Object(record),
            &ValidateOptions {
                only: Some(vec![name.to_string()]),
                ignore_absent: false,
            },
        )
    }

    /// Validate only the fields present in the record, in schema order.
    pub fn validate_present(&self, data: &Value) -> EngineResult<Vec<String>> {
        self.validate_with(
            data,
            &ValidateOptions {
                only: None,
                ignore_absent: true,
            },
        )
    }

    /// Collect errors without applying the `throw_on_error` policy; used
    /// for child engines so the parent can prefix and aggregate.
    pub(crate) fn validate_collect(
        &self,
        data: &Value,
        options: &ValidateOptions,
    ) -> SchemaResult<Vec<String>> {
        let mut errors = Vec::new();

        if let Some(bounds) = self.schema().bounds {
            match data.as_array() {
                Some(rows) => {
                    if let Some(min) = bounds.min {
                        if (rows.len() as u64) < min {
                            errors.push(format!("Data array must have at least {min} rows."));
                        }
                    }
                    if let Some(max) = bounds.max {
                        if (rows.len() as u64) > max {
                            errors.push(format!("Data array must have no more than {max} rows."));
                        }
                    }
                    for row in rows {
                        match row.as_object() {
                            Some(object) => self.validate_row(&mut errors, object, options)?,
                            None => errors.push("Data rows must be objects".to_string()),
                        }
                    }
                }
                None => errors.push("Data must be an array".to_string()),
            }
        } else {
            match data.as_object() {
                Some(object) => self.validate_row(&mut errors, object, options)?,
                None => errors.push("Data must be an object".to_string()),
            }
        }

        debug!(errors = errors.len(), "validation pass complete");
        Ok(errors)
    }

    fn validate_row(
        &self,
        errors: &mut Vec<String>,
        row: &serde_json::Map<String, Value>,
        options: &ValidateOptions,
    ) -> SchemaResult<()> {
        let ctx = RowContext { row };

        for name in self.field_names(options.only.as_deref()) {
            let Some(descriptor) = self.descriptor(name)? else {
                continue;
            };
            if options.ignore_absent && !row.contains_key(name) {
                continue;
            }
            let value = row
                .get(name)
                .cloned()
                .or_else(|| descriptor.default.clone())
                .unwrap_or(Value::Null);

            if let Some(rules) = &descriptor.rules {
                for (rule_name, param) in rules.iter() {
                    // clientOnly entries are exported, never evaluated here;
                    // serverOnly wraps the rule name it should invoke.
                    if rule_name == "clientOnly" {
                        continue;
                    }
                    let (invoked, invoked_param) = if rule_name == "serverOnly" {
                        match param.as_str() {
                            Some(inner) => (inner, Value::Bool(true)),
                            None => {
                                return Err(SchemaError::InvalidShape(format!(
                                    "serverOnly for '{name}' must name a rule"
                                )));
                            }
                        }
                    } else {
                        (rule_name, param.clone())
                    };

                    if let Some(message) =
                        self.apply_rule(invoked, &value, &invoked_param, name, &ctx)?
                    {
                        let text = descriptor
                            .messages
                            .as_ref()
                            .and_then(|overrides| overrides.get(invoked))
                            .cloned()
                            .unwrap_or(message);
                        errors.push(text);
                    }
                }
            }

            if let Some(extend) = &descriptor.extend {
                let child = self.child(name, extend)?;
                let sub_value = if value.is_null() {
                    if child.is_repeating() {
                        json!([])
                    } else {
                        json!({})
                    }
                } else {
                    value
                };
                for err in child.validate_collect(&sub_value, &ValidateOptions::default())? {
                    errors.push(format!("{name} {err}"));
                }
            }
        }
        Ok(())
    }

    /// Run one rule: the custom provider wins over the built-in library,
    /// and a name known to neither is a configuration error.
    fn apply_rule(
        &self,
        rule: &str,
        value: &Value,
        param: &Value,
        field: &str,
        ctx: &RowContext,
    ) -> SchemaResult<Option<String>> {
        if self.has_custom_rule(rule) {
            if let Some(provider) = self.provider() {
                return provider.validate(rule, value, param, field, ctx.row);
            }
        }
        match rules::lookup(rule) {
            Some(f) => f(value, param, field, ctx),
            None => Err(SchemaError::UnknownRule {
                rule: rule.to_string(),
                field: field.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::Error;
    use crate::provider::CustomProvider;

    fn validator(schema: Value) -> Validator {
        Validator::new(schema, None, false).unwrap()
    }

    #[test]
    fn test_email_scenario() {
        let v = validator(json!({
            "email": {"rules": {"required": true, "email": true}}
        }));
        assert_eq!(
            v.validate(&json!({"email": "not-an-email"})).unwrap(),
            vec!["Invalid email"]
        );
        assert_eq!(v.validate(&json!({})).unwrap(), vec!["email is required"]);
        assert_eq!(
            v.validate(&json!({"email": "a@b.com"})).unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_required_reports_exactly_one_error_with_name() {
        let v = validator(json!({
            "title": {"rules": {"required": true, "minlength": 3}}
        }));
        for record in [json!({}), json!({"title": null}), json!({"title": ""})] {
            let errors = v.validate(&record).unwrap();
            assert_eq!(errors.len(), 1, "input {record}");
            assert!(errors[0].contains("title"));
        }
    }

    #[test]
    fn test_errors_keep_schema_order_across_fields() {
        let v = validator(json!({
            "a": {"rules": "required"},
            "b": {"rules": {"required": true, "digits": true}},
            "c": {"rules": "required"}
        }));
        let errors = v.validate(&json!({"b": "xyz"})).unwrap();
        assert_eq!(
            errors,
            vec!["a is required", "b is not a digit", "c is required"]
        );
    }

    #[test]
    fn test_default_substitutes_before_rules() {
        let v = validator(json!({
            "role": {"rules": {"required": true, "inArray": ["admin", "user"]}, "default": "user"}
        }));
        assert_eq!(v.validate(&json!({})).unwrap(), Vec::<String>::new());
        assert_eq!(
            v.validate(&json!({"role": "guest"})).unwrap(),
            vec!["role must be one of: admin, user"]
        );
    }

    #[test]
    fn test_message_override() {
        let v = validator(json!({
            "age": {
                "rules": {"required": true, "digits": true},
                "message": {"digits": "Age must be a whole number"}
            }
        }));
        assert_eq!(
            v.validate(&json!({"age": "abc"})).unwrap(),
            vec!["Age must be a whole number"]
        );
        assert_eq!(v.validate(&json!({})).unwrap(), vec!["age is required"]);
    }

    #[test]
    fn test_repeating_row_counts() {
        let v = validator(json!([{"id": {"rules": "required"}}, 2, 4]));

        let one_row = v.validate(&json!([{"id": 1}])).unwrap();
        assert_eq!(one_row, vec!["Data array must have at least 2 rows."]);

        let three_rows = v
            .validate(&json!([{"id": 1}, {"id": 2}, {"id": 3}]))
            .unwrap();
        assert_eq!(three_rows, Vec::<String>::new());

        let five = v
            .validate(&json!([{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}, {"id": 5}]))
            .unwrap();
        assert_eq!(five, vec!["Data array must have no more than 4 rows."]);

        assert_eq!(
            v.validate(&json!({"id": 1})).unwrap(),
            vec!["Data must be an array"]
        );
    }

    #[test]
    fn test_row_count_violation_does_not_abort_row_checks() {
        let v = validator(json!([{"id": {"rules": "required"}}, 2]));
        let errors = v.validate(&json!([{}])).unwrap();
        assert_eq!(
            errors,
            vec!["Data array must have at least 2 rows.", "id is required"]
        );
    }

    #[test]
    fn test_extend_prefixes_child_errors() {
        let v = validator(json!({
            "address": {
                "extend": {
                    "zip": {"rules": {"required": true, "digits": true}}
                }
            }
        }));
        assert_eq!(
            v.validate(&json!({"address": {"zip": "abc"}})).unwrap(),
            vec!["address zip is not a digit"]
        );
        // Absent sub-record validates as an empty row.
        assert_eq!(
            v.validate(&json!({})).unwrap(),
            vec!["address zip is required"]
        );
    }

    #[test]
    fn test_repeating_extend_bounds_without_rows() {
        let v = validator(json!({
            "lines": {
                "extend": [{"sku": {"rules": "required"}}, 1]
            }
        }));
        let errors = v.validate(&json!({"lines": []})).unwrap();
        assert_eq!(errors, vec!["lines Data array must have at least 1 rows."]);

        let errors = v.validate(&json!({})).unwrap();
        assert_eq!(errors, vec!["lines Data array must have at least 1 rows."]);

        let ok = v.validate(&json!({"lines": [{"sku": "a"}]})).unwrap();
        assert_eq!(ok, Vec::<String>::new());
    }

    #[test]
    fn test_server_only_and_client_only_pseudo_keys() {
        let v = validator(json!({
            "token": {"rules": {"serverOnly": "digits", "clientOnly": {"minlength": 4}}}
        }));
        // serverOnly's parameter names the rule to run; clientOnly is
        // never evaluated server-side.
        assert_eq!(
            v.validate(&json!({"token": "x"})).unwrap(),
            vec!["token is not a digit"]
        );
        assert_eq!(
            v.validate(&json!({"token": "12"})).unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_unknown_rule_is_fatal() {
        let v = validator(json!({"a": {"rules": "definitelyNotARule"}}));
        let err = v.validate(&json!({"a": 1})).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::UnknownRule { .. })
        ));
    }

    #[test]
    fn test_missing_fragment_is_fatal() {
        let v = validator(json!({"a": "ghost"}));
        let err = v.validate(&json!({"a": 1})).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::MissingFragment { .. })
        ));
    }

    #[test]
    fn test_abstract_fragment_resolution() {
        let v = validator(json!({
            "abstract": {"id": {"rules": {"required": true, "digits": true}}},
            "userId": "id",
            "groupId": "id"
        }));
        let errors = v.validate(&json!({"userId": "x"})).unwrap();
        assert_eq!(errors, vec!["userId is not a digit", "groupId is required"]);
    }

    #[test]
    fn test_throw_on_error_aggregates() {
        let v = Validator::new(
            json!({"a": {"rules": "required"}, "b": {"rules": "required"}}),
            None,
            true,
        )
        .unwrap();
        let err = v.validate(&json!({})).unwrap_err();
        match err {
            Error::Validation(failure) => {
                assert_eq!(failure.errors.len(), 2);
                assert_eq!(failure.to_string(), "a is required, b is required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(v.validate(&json!({"a": 1, "b": 2})).is_ok());
    }

    #[test]
    fn test_ignore_absent_for_patch_updates() {
        let v = validator(json!({
            "name": {"rules": "required"},
            "email": {"rules": {"required": true, "email": true}}
        }));
        let options = ValidateOptions {
            only: None,
            ignore_absent: true,
        };
        assert_eq!(
            v.validate_with(&json!({"email": "a@b.com"}), &options)
                .unwrap(),
            Vec::<String>::new()
        );
        assert_eq!(
            v.validate_present(&json!({"email": "nope"})).unwrap(),
            vec!["Invalid email"]
        );
    }

    #[test]
    fn test_validate_field_and_allow_list() {
        let v = validator(json!({
            "a": {"rules": "required"},
            "b": {"rules": {"required": true, "email": true}}
        }));
        assert_eq!(
            v.validate_field("b", &json!("nope")).unwrap(),
            vec!["Invalid email"]
        );
        // The allow-list restricts which fields run at all.
        let options = ValidateOptions {
            only: Some(vec!["b".to_string()]),
            ignore_absent: false,
        };
        assert_eq!(
            v.validate_with(&json!({"b": "a@b.com"}), &options).unwrap(),
            Vec::<String>::new()
        );
    }

    struct UppercaseRule;

    impl CustomProvider for UppercaseRule {
        fn rule_names(&self) -> Vec<String> {
            vec!["shouting".to_string()]
        }
        fn sanitizer_names(&self) -> Vec<String> {
            Vec::new()
        }
        fn validate(
            &self,
            _rule: &str,
            value: &Value,
            _param: &Value,
            field: &str,
            _row: &serde_json::Map<String, Value>,
        ) -> SchemaResult<Option<String>> {
            let ok = value
                .as_str()
                .map(|s| s.chars().all(|c| !c.is_lowercase()))
                .unwrap_or(false);
            Ok((!ok).then(|| format!("{field} must be upper case")))
        }
        fn sanitize(&self, sanitizer: &str, _value: Value, _param: &Value) -> SchemaResult<Value> {
            Err(SchemaError::UnknownSanitizer {
                sanitizer: sanitizer.to_string(),
                field: String::new(),
            })
        }
    }

    #[test]
    fn test_custom_provider_consulted_first() {
        let v = Validator::new(
            json!({"code": {"rules": "shouting"}}),
            Some(Arc::new(UppercaseRule)),
            false,
        )
        .unwrap();
        assert_eq!(
            v.validate(&json!({"code": "abc"})).unwrap(),
            vec!["code must be upper case"]
        );
        assert_eq!(
            v.validate(&json!({"code": "ABC"})).unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_cross_field_rules_see_the_row() {
        let v = validator(json!({
            "password": {"rules": "required"},
            "confirm": {"rules": {"equalTo": "#password"}}
        }));
        assert_eq!(
            v.validate(&json!({"password": "abc", "confirm": "abc"}))
                .unwrap(),
            Vec::<String>::new()
        );
        assert_eq!(
            v.validate(&json!({"password": "abc", "confirm": "xyz"}))
                .unwrap(),
            vec!["confirm is not equal to password"]
        );
    }
}
