//! Property schema resolution.
//!
//! This module normalizes the declarative configuration into canonical
//! per-field descriptors:
//!
//! - `ruleset`: the three accepted rule/sanitizer shapes collapse into one
//!   insertion-ordered name→parameter map
//! - `descriptor`: field descriptors, abstract fragments, and repeating
//!   row bounds
//!
//! The engines and the client exporter only ever consume the canonical
//! form produced here.

pub mod descriptor;
pub mod ruleset;

pub use descriptor::{
    unwrap_bounds, FieldDescriptor, FieldSpec, FragmentTable, RowBounds, Schema,
};
pub use ruleset::RuleSet;
