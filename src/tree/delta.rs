//! Structural deltas between two trees.
//!
//! A [`Delta`] computed with [`Delta::diff`] records every added, removed and
//! changed item, so `diff(base, target).apply(base) == target` for any pair of
//! trees. Only the added items survive serialization: the on-disk form is the
//! vestigial file, a `dictionary_item_added` map keyed by `root['a']['b']`
//! paths.

use super::path::TreePath;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A value replaced at the same path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub old_value: Value,
    pub new_value: Value,
}

/// Structural difference from a base tree to a target tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    added: IndexMap<TreePath, Value>,
    removed: IndexMap<TreePath, Value>,
    changed: IndexMap<TreePath, Change>,
}

/// Serialized form of a delta.
#[derive(Debug, Default, Serialize, Deserialize)]
struct VestigialFile {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    dictionary_item_added: IndexMap<String, Value>,
}

impl Delta {
    /// Compute the delta that turns `base` into `target`.
    pub fn diff(base: &Value, target: &Value) -> Self {
        let mut delta = Delta::default();
        delta.diff_at(&TreePath::root(), base, target);
        delta
    }

    fn diff_at(&mut self, path: &TreePath, base: &Value, target: &Value) {
        match (base, target) {
            (Value::Object(base_map), Value::Object(target_map)) => {
                for (key, base_value) in base_map {
                    match target_map.get(key) {
                        Some(target_value) => self.diff_at(&path.child(key), base_value, target_value),
                        None => {
                            self.removed.insert(path.child(key), base_value.clone());
                        }
                    }
                }
                for (key, target_value) in target_map {
                    if !base_map.contains_key(key) {
                        self.added.insert(path.child(key), target_value.clone());
                    }
                }
            }
            _ if base != target => {
                self.changed.insert(
                    path.clone(),
                    Change {
                        old_value: base.clone(),
                        new_value: target.clone(),
                    },
                );
            }
            _ => {}
        }
    }

    /// Apply the delta to a tree: removals first, then changes, then
    /// additions. Additions create missing intermediate objects.
    pub fn apply(&self, mut tree: Value) -> Result<Value> {
        for path in self.removed.keys() {
            let Some((parent, key)) = path.split_last() else {
                return Err(delta_path_error(path, "cannot remove the root"));
            };
            let object = object_at(&mut tree, parent, path, false)?;
            if object.shift_remove(key).is_none() {
                return Err(delta_path_error(path, "no such key to remove"));
            }
        }

        for (path, change) in &self.changed {
            match path.split_last() {
                None => tree = change.new_value.clone(),
                Some((parent, key)) => {
                    let object = object_at(&mut tree, parent, path, false)?;
                    object.insert(key.to_string(), change.new_value.clone());
                }
            }
        }

        for (path, value) in &self.added {
            let Some((parent, key)) = path.split_last() else {
                return Err(delta_path_error(path, "cannot add the root"));
            };
            let object = object_at(&mut tree, parent, path, true)?;
            object.insert(key.to_string(), value.clone());
        }

        Ok(tree)
    }

    /// The added items materialized into a fresh tree.
    pub fn additions(&self) -> Result<Value> {
        Delta {
            added: self.added.clone(),
            ..Default::default()
        }
        .apply(Value::Object(Map::new()))
    }

    /// The part of this delta that survives serialization.
    pub fn vestigial(&self) -> Self {
        Delta {
            added: self.added.clone(),
            ..Default::default()
        }
    }

    pub fn added(&self) -> &IndexMap<TreePath, Value> {
        &self.added
    }

    pub fn removed(&self) -> &IndexMap<TreePath, Value> {
        &self.removed
    }

    pub fn changed(&self) -> &IndexMap<TreePath, Change> {
        &self.changed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// Serialize the added items. An empty delta serializes to `{}`.
    pub fn to_yaml(&self) -> Result<String> {
        let file = VestigialFile {
            dictionary_item_added: self
                .added
                .iter()
                .map(|(path, value)| (path.to_string(), value.clone()))
                .collect(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Parse a vestigial file. Categories other than `dictionary_item_added`
    /// are ignored; an empty or null document is an empty delta.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Delta::default());
        }
        let value: Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Ok(Delta::default());
        }

        let file: VestigialFile = serde_json::from_value(value)?;
        let mut delta = Delta::default();
        for (raw_path, value) in file.dictionary_item_added {
            delta.added.insert(raw_path.parse()?, value);
        }
        Ok(delta)
    }
}

fn delta_path_error(path: &TreePath, reason: &str) -> Error {
    Error::DeltaPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn object_at<'a>(
    tree: &'a mut Value,
    segments: &[String],
    full_path: &TreePath,
    create: bool,
) -> Result<&'a mut Map<String, Value>> {
    let mut current = tree;
    for segment in segments {
        let object = match current {
            Value::Object(object) => object,
            _ => return Err(delta_path_error(full_path, "intermediate value is not an object")),
        };
        if create && !object.contains_key(segment) {
            object.insert(segment.clone(), Value::Object(Map::new()));
        }
        current = object
            .get_mut(segment)
            .ok_or_else(|| delta_path_error(full_path, "intermediate key is missing"))?;
    }
    match current {
        Value::Object(object) => Ok(object),
        _ => Err(delta_path_error(full_path, "parent value is not an object")),
    }
}

fn brief(value: &Value) -> String {
    match value {
        Value::Object(object) => format!("{{{} keys}}", object.len()),
        other => other.to_string(),
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            writeln!(f, "No differences found.")?;
            return Ok(());
        }

        if !self.added.is_empty() {
            writeln!(f, "Added ({}):", self.added.len())?;
            for (path, value) in &self.added {
                writeln!(f, "  + {} = {}", path, brief(value))?;
            }
        }

        if !self.removed.is_empty() {
            writeln!(f, "Removed ({}):", self.removed.len())?;
            for path in self.removed.keys() {
                writeln!(f, "  - {}", path)?;
            }
        }

        if !self.changed.is_empty() {
            writeln!(f, "Changed ({}):", self.changed.len())?;
            for (path, change) in &self.changed {
                writeln!(
                    f,
                    "  ~ {}: {} -> {}",
                    path,
                    brief(&change.old_value),
                    brief(&change.new_value)
                )?;
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: +{} -{} ~{}",
            self.added.len(),
            self.removed.len(),
            self.changed.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_round_trip(base: Value, target: Value) {
        let delta = Delta::diff(&base, &target);
        assert_eq!(delta.apply(base).unwrap(), target);
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let tree = json!({"properties": {"a": {"type": "keyword"}}});
        let delta = Delta::diff(&tree, &tree);
        assert!(delta.is_empty());
        assert_eq!(delta.apply(tree.clone()).unwrap(), tree);
    }

    #[test]
    fn test_diff_categories() {
        let base = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let target = json!({"a": 1, "b": {"c": 5, "e": {"f": true}}});
        let delta = Delta::diff(&base, &target);

        let b = TreePath::root().child("b");
        assert_eq!(delta.added().get(&b.child("e")), Some(&json!({"f": true})));
        assert_eq!(delta.removed().get(&b.child("d")), Some(&json!(3)));
        assert_eq!(delta.changed()[&b.child("c")].new_value, json!(5));
        assert_eq!(delta.len(), 3);
    }

    #[test]
    fn test_round_trip_shapes() {
        assert_round_trip(json!({}), json!({"a": {"b": [1, 2]}}));
        assert_round_trip(json!({"a": {"b": 1}}), json!({}));
        assert_round_trip(json!({"a": {"b": 1}}), json!({"a": "leaf"}));
        assert_round_trip(json!({"a": "leaf"}), json!({"a": {"b": 1}}));
        assert_round_trip(json!({"a": [1, 2]}), json!({"a": [2, 1]}));
        assert_round_trip(json!({"a": null}), json!({"a": {"x": null}}));
        assert_round_trip(json!(1), json!({"a": 1}));
    }

    #[test]
    fn test_vestigial_scenario() {
        let canonical = json!({"properties": {"id": {"type": "keyword"}}});
        let previous = json!({
            "properties": {
                "id": {"type": "keyword"},
                "vestigial": {"type": "keyword"}
            }
        });
        let delta = Delta::diff(&canonical, &previous);
        let yaml = delta.to_yaml().unwrap();
        assert!(yaml.contains("root['properties']['vestigial']"));

        let parsed = Delta::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.apply(canonical).unwrap(), previous);
    }

    #[test]
    fn test_serialization_keeps_only_additions() {
        let delta = Delta::diff(&json!({"a": 1, "b": 2}), &json!({"b": 3}));
        assert!(!delta.is_empty());
        assert_eq!(delta.to_yaml().unwrap().trim(), "{}");
    }

    #[test]
    fn test_empty_delta_yaml() {
        assert_eq!(Delta::default().to_yaml().unwrap().trim(), "{}");
        assert!(Delta::from_yaml("{}").unwrap().is_empty());
        assert!(Delta::from_yaml("").unwrap().is_empty());
        assert!(Delta::from_yaml("~").unwrap().is_empty());
    }

    #[test]
    fn test_from_yaml_ignores_other_categories() {
        let yaml = r#"
dictionary_item_added:
  "root['properties']['old']":
    type: long
values_changed:
  "root['properties']['x']":
    new_value: 1
    old_value: 2
"#;
        let delta = Delta::from_yaml(yaml).unwrap();
        assert_eq!(delta.len(), 1);
        assert!(delta.removed().is_empty());
        assert!(delta.changed().is_empty());
    }

    #[test]
    fn test_apply_creates_intermediates() {
        let yaml = r#"
dictionary_item_added:
  "root['properties']['a']['properties']['b']": {type: long}
"#;
        let delta = Delta::from_yaml(yaml).unwrap();
        let applied = delta.apply(json!({"properties": {}})).unwrap();
        assert_eq!(
            applied,
            json!({"properties": {"a": {"properties": {"b": {"type": "long"}}}}})
        );
    }

    #[test]
    fn test_apply_rejects_non_object_intermediate() {
        let delta = Delta::from_yaml(r#"dictionary_item_added: {"root['a']['b']": 1}"#).unwrap();
        let err = delta.apply(json!({"a": "leaf"})).unwrap_err();
        assert!(matches!(err, Error::DeltaPath { .. }));
    }

    #[test]
    fn test_from_yaml_rejects_list_paths() {
        assert!(Delta::from_yaml(r#"dictionary_item_added: {"root['a'][0]": 1}"#).is_err());
    }

    #[test]
    fn test_additions_tree() {
        let delta = Delta::diff(
            &json!({"properties": {"a": {"type": "long"}}}),
            &json!({"properties": {"a": {"type": "long"}, "b": {"type": "text"}}}),
        );
        assert_eq!(
            delta.additions().unwrap(),
            json!({"properties": {"b": {"type": "text"}}})
        );
        assert!(delta.vestigial().removed().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Delta::default().to_string(), "No differences found.\n");

        let delta = Delta::diff(&json!({"a": 1, "b": 2}), &json!({"a": 2, "c": 3}));
        let text = delta.to_string();
        assert!(text.contains("+ root['c'] = 3"));
        assert!(text.contains("- root['b']"));
        assert!(text.contains("~ root['a']: 1 -> 2"));
        assert!(text.contains("Summary: +1 -1 ~1"));
    }
}
