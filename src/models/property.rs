//! Typed property trees and mappings.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Ordered map of property name to definition.
pub type Properties = IndexMap<String, Property>;

/// Field data type. Types the sync policies reason about are named; anything
/// else is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Boolean,
    Double,
    Keyword,
    Long,
    Nested,
    Text,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Double => "double",
            FieldType::Keyword => "keyword",
            FieldType::Long => "long",
            FieldType::Nested => "nested",
            FieldType::Text => "text",
            FieldType::Other(other) => other,
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "boolean" => FieldType::Boolean,
            "double" => FieldType::Double,
            "keyword" => FieldType::Keyword,
            "long" => FieldType::Long,
            "nested" => FieldType::Nested,
            "text" => FieldType::Text,
            _ => FieldType::Other(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node of a property tree.
///
/// A node is a container (`properties` only), a typed leaf (`type`), or both
/// (for example `nested` objects). Keys without a dedicated field are kept in
/// `extra` so nothing is lost when a tree passes through this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizer: Option<String>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub copy_to: Option<Vec<String>>,

    /// Multi-field sub-descriptors. Never traversed as properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<IndexMap<String, Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Property {
    pub fn typed(field_type: FieldType) -> Self {
        Property {
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    pub fn keyword() -> Self {
        Self::typed(FieldType::Keyword)
    }

    pub fn container(properties: Properties) -> Self {
        Property {
            properties: Some(properties),
            ..Default::default()
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.field_type == Some(FieldType::Keyword)
    }

    pub fn child(&self, name: &str) -> Option<&Property> {
        self.properties.as_ref()?.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.as_mut()?.get_mut(name)
    }

    /// Child properties, inserting an empty map when there are none.
    pub fn properties_mut(&mut self) -> &mut Properties {
        self.properties.get_or_insert_with(Properties::new)
    }

    /// Set an extra key such as `analyzer` or `search_analyzer`.
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::One(single) => vec![single],
            OneOrMany::Many(many) => many,
        }),
    )
}

// Dictionary entries without text are written as nulls.
fn skip_null_descriptions<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Option<String>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(path, text)| text.map(|text| (path, text)))
        .collect())
}

/// Metadata attached to a mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(
        default,
        deserialize_with = "skip_null_descriptions",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub descriptions: IndexMap<String, String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// The root of one doc-type's schema.
///
/// Top-level control keys (`dynamic`, `_size`, `_source`, ...) live in
/// `extra` and are never mixed into `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    pub properties: Properties,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Mapping {
    pub fn new(properties: Properties) -> Self {
        Mapping {
            properties,
            ..Default::default()
        }
    }

    /// Resolve a dotted path relative to the root `properties`.
    pub fn property_at(&self, dotted: &str) -> Option<&Property> {
        let mut segments = dotted.split('.');
        let mut current = self.properties.get(segments.next()?)?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    pub fn property_at_mut(&mut self, dotted: &str) -> Option<&mut Property> {
        let mut segments = dotted.split('.');
        let mut current = self.properties.get_mut(segments.next()?)?;
        for segment in segments {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    pub fn descriptions(&self) -> Option<&IndexMap<String, String>> {
        self.meta.as_ref().map(|meta| &meta.descriptions)
    }

    /// Remove `_meta` and return its descriptions (empty when absent).
    pub fn take_descriptions(&mut self) -> IndexMap<String, String> {
        self.meta
            .take()
            .map(|meta| meta.descriptions)
            .unwrap_or_default()
    }

    /// Replace `_meta.descriptions`; an empty map removes `_meta`.
    pub fn set_descriptions(&mut self, descriptions: IndexMap<String, String>) {
        if descriptions.is_empty() {
            self.meta = None;
        } else {
            self.meta.get_or_insert_with(Meta::default).descriptions = descriptions;
        }
    }

    pub fn to_value(&self) -> crate::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
