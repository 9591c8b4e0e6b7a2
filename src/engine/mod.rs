//! The validator engine.
//!
//! A [`Validator`] owns one canonical [`Schema`] plus the optional custom
//! provider, and exposes the two evaluation passes (`validate.rs`,
//! `sanitize.rs`) and the client exporter (`crate::export`). Nested
//! `extend` sub-schemas get their own child `Validator` instances, built
//! on first use behind a [`OnceCell`] so concurrent first access stays
//! race-free, and cached for the lifetime of the parent.

pub mod sanitize;
pub mod validate;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::error::{EngineResult, SchemaError, SchemaResult};
use crate::merge::deep_merge;
use crate::provider::CustomProvider;
use crate::schema::{FieldDescriptor, FragmentTable, Schema};

/// Options for a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Restrict the pass to these fields, in schema order.
    pub only: Option<Vec<String>>,
    /// Skip fields that are absent from the input entirely, for
    /// partial/PATCH-style validation.
    pub ignore_absent: bool,
}

/// Options for a sanitization pass.
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Restrict the pass to these fields, in schema order.
    pub only: Option<Vec<String>>,
    /// Substitute declared defaults for absent fields. Disable for
    /// PATCH-style sanitization.
    pub include_defaults: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            only: None,
            include_defaults: true,
        }
    }
}

/// Validates and sanitizes records against one declarative schema.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: Schema,
    /// The raw properties as passed in, kept for overlays.
    raw: Value,
    provider: Option<Arc<dyn CustomProvider>>,
    custom_rules: HashSet<String>,
    custom_sanitizers: HashSet<String>,
    throw_on_error: bool,
    children: HashMap<String, OnceCell<Arc<Validator>>>,
}

impl Validator {
    /// Build a validator from raw schema properties.
    ///
    /// `throw_on_error` decides, once for the validator's lifetime,
    /// whether validation failures come back as an error list or raise a
    /// single aggregate [`crate::ValidationError`].
    pub fn new(
        properties: Value,
        provider: Option<Arc<dyn CustomProvider>>,
        throw_on_error: bool,
    ) -> EngineResult<Self> {
        Ok(Self::build(properties, None, provider, throw_on_error)?)
    }

    /// Build a validator from a JSON string of schema properties.
    pub fn from_json(
        properties: &str,
        provider: Option<Arc<dyn CustomProvider>>,
        throw_on_error: bool,
    ) -> EngineResult<Self> {
        let raw: Value =
            serde_json::from_str(properties).map_err(crate::error::LoadError::Json)?;
        Self::new(raw, provider, throw_on_error)
    }

    fn build(
        raw: Value,
        inherited: Option<&Arc<FragmentTable>>,
        provider: Option<Arc<dyn CustomProvider>>,
        throw_on_error: bool,
    ) -> SchemaResult<Self> {
        let schema = Schema::parse_with_fragments(&raw, inherited)?;
        let (custom_rules, custom_sanitizers) = match &provider {
            Some(p) => (
                p.rule_names().into_iter().collect(),
                p.sanitizer_names().into_iter().collect(),
            ),
            None => (HashSet::new(), HashSet::new()),
        };
        let children = schema
            .fields
            .keys()
            .map(|name| (name.clone(), OnceCell::new()))
            .collect();
        Ok(Self {
            schema,
            raw,
            provider,
            custom_rules,
            custom_sanitizers,
            throw_on_error,
            children,
        })
    }

    /// The canonical schema this validator evaluates.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether the whole input is a repeating array of rows.
    pub fn is_repeating(&self) -> bool {
        self.schema.is_repeating()
    }

    /// Whether validation failures raise instead of returning a list.
    pub fn throws_on_error(&self) -> bool {
        self.throw_on_error
    }

    /// Replace this validator's configuration wholesale, rebuilding the
    /// canonical schema. Unlike [`Self::merge_properties`], nothing of the
    /// previous configuration survives.
    pub fn replace_properties(&mut self, properties: Value) -> EngineResult<()> {
        let rebuilt = Self::build(
            properties,
            None,
            self.provider.clone(),
            self.throw_on_error,
        )?;
        *self = rebuilt;
        Ok(())
    }

    /// Overlay additional raw properties onto this validator, deep-merging
    /// into the existing configuration, and rebuild the canonical schema.
    pub fn merge_properties(&mut self, extra: Value) -> EngineResult<()> {
        match &mut self.raw {
            Value::Array(items) if !items.is_empty() => deep_merge(&mut items[0], extra),
            other => deep_merge(other, extra),
        }
        let rebuilt = Self::build(
            self.raw.clone(),
            None,
            self.provider.clone(),
            self.throw_on_error,
        )?;
        *self = rebuilt;
        Ok(())
    }

    /// Descend a dotted path of `extend` sub-schemas, returning an
    /// independent validator for that sub-schema. A `0` segment steps from
    /// a repeating schema into its element schema.
    pub fn subvalidator(&self, path: &str) -> EngineResult<Validator> {
        let mut current = self.clone();
        for key in path.split('.') {
            if key == "0" {
                if current.schema.bounds.is_some() {
                    current.schema.bounds = None;
                    continue;
                }
                return Err(SchemaError::UnknownPath(path.to_string()).into());
            }
            let descriptor = {
                let spec = current
                    .schema
                    .fields
                    .get(key)
                    .ok_or_else(|| SchemaError::UnknownPath(path.to_string()))?;
                current.schema.resolve(key, spec)?.clone()
            };
            let extend = descriptor
                .extend
                .as_ref()
                .ok_or_else(|| SchemaError::UnknownPath(path.to_string()))?;
            let child = current.child(key, extend)?;
            let mut next = child.as_ref().clone();
            next.throw_on_error = self.throw_on_error;
            current = next;
        }
        Ok(current)
    }

    /// Resolve a field to its descriptor, following fragment aliases.
    pub(crate) fn descriptor(&self, name: &str) -> SchemaResult<Option<&FieldDescriptor>> {
        match self.schema.fields.get(name) {
            None => Ok(None),
            Some(spec) => self.schema.resolve(name, spec).map(Some),
        }
    }

    /// Fetch or build the child engine for a field's `extend` sub-schema.
    ///
    /// Children inherit the provider and fragment table, and always
    /// collect errors rather than raising, so the parent can prefix and
    /// aggregate them.
    pub(crate) fn child(&self, name: &str, extend: &Value) -> SchemaResult<Arc<Validator>> {
        let cell = self
            .children
            .get(name)
            .ok_or_else(|| SchemaError::UnknownPath(name.to_string()))?;
        cell.get_or_try_init(|| {
            Self::build(
                extend.clone(),
                Some(&self.schema.fragments),
                self.provider.clone(),
                false,
            )
            .map(Arc::new)
        })
        .cloned()
    }

    pub(crate) fn has_custom_rule(&self, name: &str) -> bool {
        self.custom_rules.contains(name)
    }

    pub(crate) fn has_custom_sanitizer(&self, name: &str) -> bool {
        self.custom_sanitizers.contains(name)
    }

    pub(crate) fn provider(&self) -> Option<&Arc<dyn CustomProvider>> {
        self.provider.as_ref()
    }

    /// Iterate field names in schema order, honoring an allow-list.
    pub(crate) fn field_names<'a>(&'a self, only: Option<&'a [String]>) -> Vec<&'a str> {
        self.schema
            .fields
            .keys()
            .map(String::as_str)
            .filter(|name| {
                only.map(|list| list.iter().any(|o| o.as_str() == *name))
                    .unwrap_or(true)
            })
            .collect()
    }
}
