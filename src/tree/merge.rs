//! Additive deep merge for YAML/JSON trees.
//!
//! Fills gaps in a target tree from one or more default trees. Values already
//! present in the target are never replaced; arrays are treated as leaves.

use serde_json::Value;

/// Deep merge `sources` into `target`, filling only keys the target lacks.
///
/// - Objects are merged recursively
/// - Any non-object value already in the target wins over every source
/// - For a key missing from the target, the first source defining it supplies the value
/// - Sources are only read
///
/// # Example
/// ```
/// use serde_json::json;
/// use esmodels::tree::merge;
///
/// let mapping = json!({
///     "dynamic": "false",
///     "properties": { "id": { "type": "keyword" } }
/// });
/// let defaults = json!({
///     "dynamic": "strict",
///     "_size": { "enabled": true }
/// });
/// let result = merge(mapping, [&defaults]);
/// assert_eq!(result["dynamic"], "false");
/// assert_eq!(result["_size"]["enabled"], true);
/// ```
pub fn merge<'a>(target: Value, sources: impl IntoIterator<Item = &'a Value>) -> Value {
    sources.into_iter().fold(target, merge_one)
}

/// Merge a list of trees where earlier trees take precedence over later ones.
///
/// Equivalent to `merge(first, rest)`; an empty list yields `Value::Null`.
pub fn merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    let mut values = values.into_iter();
    let Some(first) = values.next() else {
        return Value::Null;
    };
    values.fold(first, |acc, value| merge_one(acc, &value))
}

fn merge_one(target: Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                match target_map.get_mut(key) {
                    Some(target_value) => {
                        if target_value.is_object() && source_value.is_object() {
                            let existing = target_value.take();
                            *target_value = merge_one(existing, source_value);
                        }
                    }
                    None => {
                        target_map.insert(key.clone(), source_value.clone());
                    }
                }
            }
            Value::Object(target_map)
        }
        (target, _) => target,
    }
}
