//! # Fieldcheck - declarative validation and sanitization for JSON records
//!
//! Fieldcheck evaluates a declarative rule set (nested name→rule→parameter
//! mappings) against JSON-shaped records, producing either a cleaned
//! record or an ordered list of human-readable errors, and can export an
//! equivalent rule set for a browser-side validation library.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │ Raw schema  │────▶│  Resolver   │────▶│ Canonical schema │
//! │ (JSON/file) │     │ (normalize) │     │  (descriptors)   │
//! └─────────────┘     └─────────────┘     └────────┬─────────┘
//!                                                  │
//!                     ┌────────────────┬───────────┴───────────┐
//!                     ▼                ▼                       ▼
//!              ┌────────────┐   ┌────────────┐        ┌───────────────┐
//!              │  validate  │   │  sanitize  │        │ client export │
//!              │ (errors[]) │   │ (cleaned)  │        │ ({rules,msgs})│
//!              └────────────┘   └────────────┘        └───────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use fieldcheck::Validator;
//! use serde_json::json;
//!
//! let validator = Validator::new(
//!     json!({
//!         "email": {"rules": {"required": true, "email": true}},
//!         "name": {"rules": "required", "sanitizers": "trim"}
//!     }),
//!     None,
//!     false,
//! ).unwrap();
//!
//! let errors = validator.validate(&json!({"email": "not-an-email"})).unwrap();
//! assert_eq!(errors, vec!["Invalid email", "name is required"]);
//!
//! let cleaned = validator
//!     .sanitize(&json!({"email": "a@b.com", "name": "  Ada  "}))
//!     .unwrap();
//! assert_eq!(cleaned, json!({"email": "a@b.com", "name": "Ada"}));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - two-class error hierarchy (configuration vs validation)
//! - [`schema`] - raw config to canonical descriptors
//! - [`rules`] / [`sanitizers`] - built-in libraries behind name→fn registries
//! - [`provider`] - pluggable custom rules and sanitizers
//! - [`engine`] - the validator and its two evaluation passes
//! - [`export`] - client-side schema projection
//! - [`merge`] / [`loader`] - deep-merge and schema-file loading

// Core modules
pub mod error;
pub mod schema;

// Rule and sanitizer catalogs
pub mod rules;
pub mod sanitizers;

// Custom providers
pub mod provider;

// Engine
pub mod engine;

// Client export
pub mod export;

// Config merging and file loading
pub mod loader;
pub mod merge;

// Shared coercion helpers
mod value;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    EngineResult, Error, LoadError, LoadResult, SchemaError, SchemaResult, ValidationError,
};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{FieldDescriptor, FieldSpec, FragmentTable, RowBounds, RuleSet, Schema};

// =============================================================================
// Re-exports - Engine
// =============================================================================

pub use engine::{SanitizeOptions, ValidateOptions, Validator};

// =============================================================================
// Re-exports - Catalogs and providers
// =============================================================================

pub use provider::{CustomProvider, NoCustoms};
pub use rules::{RowContext, RuleFn};
pub use sanitizers::SanitizerFn;

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::ClientSchema;

// =============================================================================
// Re-exports - Merging and loading
// =============================================================================

pub use loader::load_merged;
pub use merge::{deep_merge, merge_all};
