//! Deep merge of JSON attribute trees

use serde_json::Value;

/// Deep merge two JSON values
///
/// If both values are objects, merge them recursively with `other` taking precedence.
/// Otherwise, `other` replaces `base`.
pub fn deep_merge(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_val) in other_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge(base_val, other_val);
                } else {
                    base_map.insert(key.clone(), other_val.clone());
                }
            }
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}
