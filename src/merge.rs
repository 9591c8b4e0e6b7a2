//! Recursive deep-merge of raw JSON property maps.
//!
//! Used when multiple schema files are combined and when callers overlay
//! extra properties onto an existing rule set: later values win on
//! conflicting leaf keys, objects merge key-by-key, and arrays merge
//! element-by-element (extra overlay elements are appended).

use serde_json::Value;

/// Merge `overlay` into `base` in place.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base_arr), Value::Array(overlay_arr)) => {
            for (i, value) in overlay_arr.into_iter().enumerate() {
                if i < base_arr.len() {
                    deep_merge(&mut base_arr[i], value);
                } else {
                    base_arr.push(value);
                }
            }
        }
        (base_slot, value) => *base_slot = value,
    }
}

/// Merge a sequence of documents left to right, returning the combined
/// result. Returns `None` for an empty sequence.
pub fn merge_all<I: IntoIterator<Item = Value>>(documents: I) -> Option<Value> {
    let mut iter = documents.into_iter();
    let mut merged = iter.next()?;
    for doc in iter {
        deep_merge(&mut merged, doc);
    }
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_override() {
        let mut base = json!({"a": {"rules": "required", "default": 1}});
        deep_merge(&mut base, json!({"a": {"default": 2}}));
        assert_eq!(base, json!({"a": {"rules": "required", "default": 2}}));
    }

    #[test]
    fn test_disjoint_keys_kept() {
        let mut base = json!({"a": 1});
        deep_merge(&mut base, json!({"b": 2}));
        assert_eq!(base, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_array_merges_by_index() {
        let mut base = json!([{"a": {"rules": "required"}}, 1]);
        deep_merge(&mut base, json!([{"a": {"default": 5}}, 2, 3]));
        assert_eq!(
            base,
            json!([{"a": {"rules": "required", "default": 5}}, 2, 3])
        );
    }

    #[test]
    fn test_merge_all() {
        let merged = merge_all(vec![
            json!({"a": {"rules": "required"}}),
            json!({"a": {"sanitizers": "trim"}}),
            json!({"b": {"rules": "email"}}),
        ])
        .unwrap();
        assert_eq!(
            merged,
            json!({
                "a": {"rules": "required", "sanitizers": "trim"},
                "b": {"rules": "email"}
            })
        );
        assert!(merge_all(Vec::new()).is_none());
    }
}
