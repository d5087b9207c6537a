//! Building sync pipelines from configuration.

use super::{
    AutocompleteSynchronizer, CompositeSynchronizer, DefaultMappingsSynchronizer,
    DefaultSettingsSynchronizer, DescriptionsSynchronizer, NormalizerSynchronizer,
};
use crate::config::{Config, StepKind};
use crate::dictionary::DictionaryLookup;
use crate::error::Result;
use std::sync::Arc;
use tracing::warn;

/// Assembles the [`CompositeSynchronizer`] for each doc-type.
pub struct PipelineBuilder<'a> {
    config: &'a Config,
    dictionary: Option<Arc<dyn DictionaryLookup>>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            dictionary: None,
        }
    }

    pub fn with_dictionary(mut self, dictionary: Arc<dyn DictionaryLookup>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn build(&self, index: &str, doc_type: &str) -> Result<CompositeSynchronizer> {
        let pipeline = self.config.pipeline(index, doc_type);
        let mut composite = CompositeSynchronizer::default();

        for step in &pipeline.steps {
            match step {
                StepKind::DefaultMappings => composite.push(DefaultMappingsSynchronizer::new()?),
                StepKind::DefaultSettings => composite.push(DefaultSettingsSynchronizer::new()?),
                StepKind::Normalizer => composite.push(NormalizerSynchronizer::new(
                    self.config.normalizer.name.clone(),
                    self.config.normalizer.excluded.iter().cloned(),
                )),
                StepKind::Autocomplete => match &pipeline.autocomplete {
                    Some(autocomplete) => composite.push(AutocompleteSynchronizer::new(
                        autocomplete.field.clone(),
                        autocomplete.sources.clone(),
                    )),
                    None => warn!(index, doc_type, "Autocomplete step has no autocomplete settings; skipping"),
                },
                StepKind::Descriptions => match &self.dictionary {
                    Some(dictionary) => composite.push(DescriptionsSynchronizer::new(
                        Arc::clone(dictionary),
                        pipeline.descriptions.clone(),
                    )),
                    None => warn!(index, doc_type, "Descriptions step needs a dictionary; skipping"),
                },
            }
        }

        Ok(composite)
    }
}
