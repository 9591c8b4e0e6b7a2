//! Schema file loading.
//!
//! The core engine never touches the filesystem; this collaborator module
//! reads one or more JSON schema files and deep-merges them (later files
//! win on conflicting leaf keys) before handing the combined properties to
//! [`Validator`].

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::engine::Validator;
use crate::error::{EngineResult, LoadError, LoadResult};
use crate::merge::merge_all;
use crate::provider::CustomProvider;

/// Read and deep-merge a sequence of JSON schema files.
pub fn load_merged<P: AsRef<Path>>(paths: &[P]) -> LoadResult<Value> {
    let mut documents: Vec<Value> = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(path)?;
        documents.push(serde_json::from_str(&content)?);
    }
    debug!(files = documents.len(), "loaded schema files");
    merge_all(documents).ok_or(LoadError::NoFiles)
}

impl Validator {
    /// Build a validator from one or more schema files, merged in order.
    pub fn from_files<P: AsRef<Path>>(
        paths: &[P],
        provider: Option<Arc<dyn CustomProvider>>,
        throw_on_error: bool,
    ) -> EngineResult<Self> {
        let raw = load_merged(paths)?;
        Self::new(raw, provider, throw_on_error)
    }

    /// Overlay additional rule files onto an existing validator.
    pub fn merge_properties_from_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> EngineResult<()> {
        let extra = load_merged(paths)?;
        self.merge_properties(extra)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use serde_json::json;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &Value) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    #[test]
    fn test_load_merged_later_files_win() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_file(
            &dir,
            "base.json",
            &json!({"name": {"rules": "required", "sanitizers": "trim"}}),
        );
        let overlay = write_file(
            &dir,
            "overlay.json",
            &json!({"name": {"rules": {"required": false}}, "email": {"rules": "email"}}),
        );

        let merged = load_merged(&[&base, &overlay]).unwrap();
        assert_eq!(
            merged,
            json!({
                "name": {"rules": {"required": false}, "sanitizers": "trim"},
                "email": {"rules": "email"}
            })
        );
    }

    #[test]
    fn test_from_files_builds_working_validator() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "schema.json",
            &json!({"email": {"rules": {"required": true, "email": true}}}),
        );
        let v = Validator::from_files(&[&path], None, false).unwrap();
        assert_eq!(
            v.validate(&json!({"email": "nope"})).unwrap(),
            vec!["Invalid email"]
        );
    }

    #[test]
    fn test_error_cases() {
        let empty: [&std::path::Path; 0] = [];
        assert!(matches!(load_merged(&empty), Err(LoadError::NoFiles)));

        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(matches!(load_merged(&[&bad]), Err(LoadError::Json(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_merged(&[&missing]), Err(LoadError::Io(_))));
    }

    #[test]
    fn test_merge_properties_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let extra = write_file(&dir, "extra.json", &json!({"age": {"sanitizers": "int"}}));

        let mut v = Validator::new(json!({"name": {"rules": "required"}}), None, false).unwrap();
        v.merge_properties_from_files(&[&extra]).unwrap();
        assert_eq!(
            v.sanitize(&json!({"age": "7abc", "name": "x"})).unwrap(),
            json!({"name": "x", "age": 7})
        );
    }
}
