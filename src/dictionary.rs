//! Field descriptions from an external data dictionary.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Answers "what does this field of this entity mean?".
pub trait DictionaryLookup {
    /// Human-readable description, if the dictionary has one.
    fn description(&self, entity: &str, field: &str) -> Option<String>;

    /// Field names the dictionary defines for an entity, in order.
    fn fields(&self, entity: &str) -> Vec<String>;
}

#[derive(Debug, Default, Deserialize)]
struct EntitySchema {
    #[serde(default)]
    properties: IndexMap<String, Value>,
}

/// A dictionary stored as YAML:
///
/// ```yaml
/// case:
///   properties:
///     submitter_id:
///       description: A project-specific identifier.
///     disease_type:
///       common:
///         description: Type of disease.
/// ```
#[derive(Debug, Default)]
pub struct YamlDictionary {
    entities: IndexMap<String, EntitySchema>,
}

impl YamlDictionary {
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let entities: Option<IndexMap<String, EntitySchema>> = serde_yaml::from_str(text)?;
        Ok(Self {
            entities: entities.unwrap_or_default(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&text).map_err(|e| Error::malformed(path, e.to_string()))
    }
}

impl DictionaryLookup for YamlDictionary {
    fn description(&self, entity: &str, field: &str) -> Option<String> {
        let definition = self.entities.get(entity)?.properties.get(field)?;
        definition
            .get("description")
            .or_else(|| definition.get("common")?.get("description"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn fields(&self, entity: &str) -> Vec<String> {
        self.entities
            .get(entity)
            .map(|schema| schema.properties.keys().cloned().collect())
            .unwrap_or_default()
    }
}
