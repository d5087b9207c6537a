//! Policy pipeline that recomputes canonical mappings and settings.
//!
//! Every step is a [`Synchronizer`]: an owned `(Mapping, Settings)` pair goes
//! in, an updated pair comes out. Steps only fill in what is missing, so
//! running a pipeline twice gives the same result as running it once.

mod autocomplete;
mod defaults;
mod descriptions;
mod normalizer;
mod pipeline;
mod reconcile;

pub use autocomplete::{AutocompleteSynchronizer, autocomplete_property};
pub use defaults::{DefaultMappingsSynchronizer, DefaultSettingsSynchronizer};
pub use descriptions::{DescriptionTarget, DescriptionsSynchronizer};
pub use normalizer::{DEFAULT_EXCLUDED_PROPERTIES, DEFAULT_NORMALIZER, NormalizerSynchronizer};
pub use pipeline::PipelineBuilder;
pub use reconcile::{Reconciler, SyncOutcome, SyncRequest, run_sync};

use crate::error::Result;
use crate::models::{Mapping, Settings};

/// One policy step.
pub trait Synchronizer {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn sync(&self, mapping: Mapping, settings: Settings) -> Result<(Mapping, Settings)>;
}

/// Applies a sequence of synchronizers in order.
#[derive(Default)]
pub struct CompositeSynchronizer {
    steps: Vec<Box<dyn Synchronizer>>,
}

impl CompositeSynchronizer {
    pub fn new(steps: Vec<Box<dyn Synchronizer>>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: impl Synchronizer + 'static) {
        self.steps.push(Box::new(step));
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Synchronizer for CompositeSynchronizer {
    fn name(&self) -> &str {
        "composite"
    }

    fn sync(&self, mapping: Mapping, settings: Settings) -> Result<(Mapping, Settings)> {
        self.steps
            .iter()
            .try_fold((mapping, settings), |(mapping, settings), step| {
                tracing::trace!(step = step.name(), "Applying synchronizer");
                step.sync(mapping, settings)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Property;

    struct AddField(&'static str);

    impl Synchronizer for AddField {
        fn name(&self) -> &str {
            self.0
        }

        fn sync(&self, mut mapping: Mapping, settings: Settings) -> Result<(Mapping, Settings)> {
            mapping
                .properties
                .insert(self.0.to_string(), Property::keyword());
            Ok((mapping, settings))
        }
    }

    #[test]
    fn test_composite_applies_in_order() {
        let mut composite = CompositeSynchronizer::default();
        composite.push(AddField("first"));
        composite.push(AddField("second"));

        let (mapping, _) = composite.sync(Mapping::default(), Settings::new()).unwrap();
        let keys: Vec<&String> = mapping.properties.keys().collect();
        assert_eq!(keys, vec!["first", "second"]);
        assert_eq!(composite.step_names(), vec!["first", "second"]);
    }

    #[test]
    fn test_empty_composite_is_identity() {
        let composite = CompositeSynchronizer::default();
        assert!(composite.is_empty());
        let (mapping, settings) = composite.sync(Mapping::default(), Settings::new()).unwrap();
        assert_eq!(mapping, Mapping::default());
        assert!(settings.is_empty());
    }
}
