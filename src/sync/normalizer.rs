//! Keyword normalizer injection.

use super::Synchronizer;
use crate::error::Result;
use crate::models::{Mapping, Properties, Settings};
use std::collections::HashSet;

pub const DEFAULT_NORMALIZER: &str = "clinical_normalizer";

/// Keyword fields left case-sensitive.
pub const DEFAULT_EXCLUDED_PROPERTIES: &[&str] = &[
    "biotype",
    "case_submitter_id",
    "code",
    "consequence_type",
    "data_type",
    "entity_submitter_id",
    "experimental_strategy",
    "gene_id",
    "name",
    "program",
    "program_name",
    "project",
    "project_code",
    "project_id",
    "project_name",
    "submitter_id",
    "uuid",
    "workflow_type",
];

/// Sets `normalizer` on every keyword field whose name is not excluded,
/// at any depth. An existing normalizer is never replaced.
pub struct NormalizerSynchronizer {
    normalizer: String,
    excluded: HashSet<String>,
}

impl Default for NormalizerSynchronizer {
    fn default() -> Self {
        Self::new(DEFAULT_NORMALIZER, DEFAULT_EXCLUDED_PROPERTIES.iter().copied())
    }
}

impl NormalizerSynchronizer {
    pub fn new<I, S>(normalizer: impl Into<String>, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            normalizer: normalizer.into(),
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    fn apply(&self, properties: &mut Properties) {
        for (name, property) in properties.iter_mut() {
            if property.is_keyword()
                && property.normalizer.is_none()
                && !self.excluded.contains(name)
            {
                property.normalizer = Some(self.normalizer.clone());
            }
            if let Some(children) = &mut property.properties {
                self.apply(children);
            }
        }
    }
}

impl Synchronizer for NormalizerSynchronizer {
    fn name(&self) -> &str {
        "normalizer"
    }

    fn sync(&self, mut mapping: Mapping, settings: Settings) -> Result<(Mapping, Settings)> {
        self.apply(&mut mapping.properties);
        Ok((mapping, settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn run(sync: &NormalizerSynchronizer, value: Value) -> Value {
        let mapping = Mapping::from_value(value).unwrap();
        let (mapping, settings) = sync.sync(mapping, Settings::new()).unwrap();
        assert!(settings.is_empty());
        mapping.to_value().unwrap()
    }

    fn test_norm(excluded: &[&str]) -> NormalizerSynchronizer {
        NormalizerSynchronizer::new("test_norm", excluded.iter().copied())
    }

    #[test]
    fn test_adds_normalizer() {
        let result = run(&test_norm(&[]), json!({"properties": {"foo": {"type": "keyword"}}}));
        assert_eq!(result["properties"]["foo"]["normalizer"], json!("test_norm"));
    }

    #[test]
    fn test_adds_normalizer_recursively() {
        let result = run(
            &test_norm(&[]),
            json!({"properties": {"foo": {"properties": {"bar": {"type": "keyword"}}}}}),
        );
        assert_eq!(
            result["properties"]["foo"]["properties"]["bar"]["normalizer"],
            json!("test_norm")
        );
    }

    #[test]
    fn test_recurses_below_keyword_nodes() {
        let result = run(
            &test_norm(&[]),
            json!({"properties": {"foo": {
                "type": "keyword",
                "properties": {"bar": {"type": "keyword"}}
            }}}),
        );
        assert_eq!(result["properties"]["foo"]["normalizer"], json!("test_norm"));
        assert_eq!(
            result["properties"]["foo"]["properties"]["bar"]["normalizer"],
            json!("test_norm")
        );
    }

    #[test]
    fn test_excluded_properties() {
        let result = run(&test_norm(&["foo"]), json!({"properties": {"foo": {"type": "keyword"}}}));
        assert!(result["properties"]["foo"].get("normalizer").is_none());
    }

    #[test]
    fn test_skips_non_keyword_and_existing() {
        let result = run(
            &test_norm(&[]),
            json!({"properties": {
                "n": {"type": "long"},
                "k": {"type": "keyword", "normalizer": "other"}
            }}),
        );
        assert!(result["properties"]["n"].get("normalizer").is_none());
        assert_eq!(result["properties"]["k"]["normalizer"], json!("other"));
    }

    #[test]
    fn test_default_exclusions() {
        let result = run(
            &NormalizerSynchronizer::default(),
            json!({"properties": {
                "submitter_id": {"type": "keyword"},
                "disease_type": {"type": "keyword"}
            }}),
        );
        assert!(result["properties"]["submitter_id"].get("normalizer").is_none());
        assert_eq!(
            result["properties"]["disease_type"]["normalizer"],
            json!(DEFAULT_NORMALIZER)
        );
    }

    #[test]
    fn test_dotted_field_names() {
        let result = run(
            &test_norm(&[]),
            json!({"properties": {
                "a.b": {"type": "keyword"},
                "c": {"properties": {"d.e": {"type": "keyword"}}}
            }}),
        );
        assert_eq!(result["properties"]["a.b"]["normalizer"], json!("test_norm"));
        assert_eq!(
            result["properties"]["c"]["properties"]["d.e"]["normalizer"],
            json!("test_norm")
        );
    }

    #[test]
    fn test_idempotent() {
        let sync = NormalizerSynchronizer::default();
        let once = run(&sync, json!({"properties": {"a": {"properties": {"b": {"type": "keyword"}}}}}));
        assert_eq!(run(&sync, once.clone()), once);
    }
}
