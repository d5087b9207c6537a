//! Field descriptions attached under `_meta.descriptions`.

use super::Synchronizer;
use crate::dictionary::DictionaryLookup;
use crate::error::Result;
use crate::models::{Mapping, Settings};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where an entity's fields appear in a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionTarget {
    /// Entity whose fields are described.
    pub entity: String,
    /// Dictionary entry to read descriptions from, when it differs from
    /// `entity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Dotted prefixes the entity's fields live under.
    pub prefixes: Vec<String>,
}

/// Rebuilds `_meta.descriptions` from a dictionary.
pub struct DescriptionsSynchronizer {
    dictionary: Arc<dyn DictionaryLookup>,
    targets: Vec<DescriptionTarget>,
}

impl DescriptionsSynchronizer {
    pub fn new(dictionary: Arc<dyn DictionaryLookup>, targets: Vec<DescriptionTarget>) -> Self {
        Self {
            dictionary,
            targets,
        }
    }

    fn descriptions(&self) -> IndexMap<String, String> {
        let mut descriptions = IndexMap::new();
        for target in &self.targets {
            let label = target.label.as_deref().unwrap_or(&target.entity);
            for field in self.dictionary.fields(&target.entity) {
                let Some(text) = self.dictionary.description(label, &field) else {
                    continue;
                };
                for prefix in &target.prefixes {
                    descriptions.insert(format!("{}.{}", prefix, field), text.clone());
                }
            }
        }
        descriptions
    }
}

impl Synchronizer for DescriptionsSynchronizer {
    fn name(&self) -> &str {
        "descriptions"
    }

    fn sync(&self, mut mapping: Mapping, settings: Settings) -> Result<(Mapping, Settings)> {
        mapping.set_descriptions(self.descriptions());
        Ok((mapping, settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::YamlDictionary;

    fn dictionary() -> Arc<dyn DictionaryLookup> {
        Arc::new(
            YamlDictionary::from_yaml(
                r#"
case:
  properties:
    submitter_id: {description: Case identifier.}
    days_to_index: {}
annotation:
  properties:
    submitter_id: {description: Annotation identifier.}
"#,
            )
            .unwrap(),
        )
    }

    fn target(entity: &str, label: Option<&str>, prefixes: &[&str]) -> DescriptionTarget {
        DescriptionTarget {
            entity: entity.to_string(),
            label: label.map(str::to_string),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_descriptions_for_every_prefix() {
        let sync = DescriptionsSynchronizer::new(
            dictionary(),
            vec![target("case", None, &["cases.case", "files.cases"])],
        );
        let (mapping, _) = sync.sync(Mapping::default(), Settings::new()).unwrap();
        let descriptions = mapping.descriptions().unwrap();
        assert_eq!(descriptions["cases.case.submitter_id"], "Case identifier.");
        assert_eq!(descriptions["files.cases.submitter_id"], "Case identifier.");
        // Fields without a description are left out.
        assert!(!descriptions.contains_key("cases.case.days_to_index"));
    }

    #[test]
    fn test_label_overrides_dictionary_entry() {
        let sync = DescriptionsSynchronizer::new(
            dictionary(),
            vec![target("case", Some("annotation"), &["annotations.annotation"])],
        );
        let (mapping, _) = sync.sync(Mapping::default(), Settings::new()).unwrap();
        assert_eq!(
            mapping.descriptions().unwrap()["annotations.annotation.submitter_id"],
            "Annotation identifier."
        );
    }

    #[test]
    fn test_no_descriptions_leaves_no_meta() {
        let sync = DescriptionsSynchronizer::new(dictionary(), vec![target("sample", None, &["x"])]);
        let (mapping, _) = sync.sync(Mapping::default(), Settings::new()).unwrap();
        assert!(mapping.meta.is_none());
    }
}
