//! Autocomplete multi-field injection.

use super::Synchronizer;
use crate::error::{Error, Result};
use crate::models::{FieldType, Mapping, Property, Settings};
use indexmap::IndexMap;

/// The keyword multi-field that autocomplete sources are copied into.
pub fn autocomplete_property() -> Property {
    let text = Property::typed(FieldType::Text);
    let fields = IndexMap::from([
        (
            "analyzed".to_string(),
            text.clone()
                .with_extra("analyzer", "autocomplete_analyzed")
                .with_extra("search_analyzer", "lowercase_keyword"),
        ),
        (
            "lowercase".to_string(),
            text.clone().with_extra("analyzer", "lowercase_keyword"),
        ),
        (
            "prefix".to_string(),
            text.with_extra("analyzer", "autocomplete_prefix")
                .with_extra("search_analyzer", "lowercase_keyword"),
        ),
    ]);
    Property {
        fields: Some(fields),
        ..Property::keyword()
    }
}

/// Copies a list of source fields into a top-level autocomplete field.
pub struct AutocompleteSynchronizer {
    field: String,
    sources: Vec<String>,
}

impl AutocompleteSynchronizer {
    /// `sources` are dotted paths relative to the root properties.
    pub fn new(field: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            field: field.into(),
            sources,
        }
    }
}

impl Synchronizer for AutocompleteSynchronizer {
    fn name(&self) -> &str {
        "autocomplete"
    }

    fn sync(&self, mut mapping: Mapping, settings: Settings) -> Result<(Mapping, Settings)> {
        for source in &self.sources {
            let property = mapping
                .property_at_mut(source)
                .ok_or_else(|| Error::FieldNotFound {
                    path: source.clone(),
                })?;
            property.copy_to = Some(vec![self.field.clone()]);
        }
        mapping
            .properties
            .insert(self.field.clone(), autocomplete_property());
        Ok((mapping, settings))
    }
}
