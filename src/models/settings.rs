//! Index settings with dotted-key expansion.

use crate::error::{Error, Result};
use crate::tree;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Index-level settings.
///
/// Keys may be dotted (`index.max_result_window`) or nested. Loaded settings
/// are already expanded; call [`Settings::expand`] on hand-built ones before
/// comparing or merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Expand every dotted key into nested form, recursing into nested
    /// objects. Idempotent.
    ///
    /// When a dotted key and a nested key describe the same leaf, the dotted
    /// key wins. A path that is a value under one key and a section under
    /// another is an error.
    pub fn expand(self) -> Result<Self> {
        Ok(Settings(expand_map(self.0)?))
    }

    /// Fill keys missing from these settings with those from `defaults`.
    /// Both sides are expanded first.
    pub fn with_defaults(self, defaults: &Settings) -> Result<Self> {
        let defaults = defaults.clone().expand()?.into_value();
        match tree::merge(self.expand()?.into_value(), [&defaults]) {
            Value::Object(map) => Ok(Settings(map)),
            _ => Ok(Settings::default()),
        }
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Settings(map)
    }
}

impl TryFrom<Value> for Settings {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Settings::default()),
            Value::Object(map) => Ok(Settings(map)),
            other => Err(Error::Json(serde::de::Error::custom(format!(
                "settings must be a mapping, found {}",
                other
            )))),
        }
    }
}

fn expand_map(map: Map<String, Value>) -> Result<Map<String, Value>> {
    let (dotted, plain): (Vec<_>, Vec<_>) =
        map.into_iter().partition(|(key, _)| key.contains('.'));

    let mut expanded = Map::new();
    // Plain keys go in first so dotted keys overlay them.
    for (key, value) in plain.into_iter().chain(dotted) {
        let value = match value {
            Value::Object(inner) => Value::Object(expand_map(inner)?),
            other => other,
        };
        let segments: Vec<&str> = key.split('.').collect();
        insert_at(&mut expanded, &key, &segments, value)?;
    }
    Ok(expanded)
}

fn insert_at(
    map: &mut Map<String, Value>,
    key: &str,
    segments: &[&str],
    value: Value,
) -> Result<()> {
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut current = map;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match slot {
            Value::Object(inner) => inner,
            _ => return Err(conflict(key, segment)),
        };
    }

    match current.get_mut(*last) {
        Some(existing) => overlay(existing, value, key),
        None => {
            current.insert(last.to_string(), value);
            Ok(())
        }
    }
}

/// Write `value` over `existing`, descending through sections on both sides.
fn overlay(existing: &mut Value, value: Value, key: &str) -> Result<()> {
    match (existing, value) {
        (Value::Object(target), Value::Object(source)) => {
            for (name, value) in source {
                match target.get_mut(&name) {
                    Some(slot) => overlay(slot, value, key)?,
                    None => {
                        target.insert(name, value);
                    }
                }
            }
            Ok(())
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => Err(conflict(key, key)),
        (slot, value) => {
            *slot = value;
            Ok(())
        }
    }
}

fn conflict(key: &str, segment: &str) -> Error {
    Error::SettingsConflict {
        key: key.to_string(),
        reason: format!("'{}' is both a value and a section", segment),
    }
}
