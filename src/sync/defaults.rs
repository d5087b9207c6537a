//! Baseline mapping and settings every index starts from.

use super::Synchronizer;
use crate::error::Result;
use crate::models::{Mapping, Settings};
use crate::tree;
use serde_json::Value;

const DEFAULT_MAPPING: &str = include_str!("defaults/mapping.yaml");
const DEFAULT_SETTINGS: &str = include_str!("defaults/settings.yaml");

/// Fills top-level mapping keys (`dynamic`, `_source`, `_size`, ...) from a
/// baseline tree.
pub struct DefaultMappingsSynchronizer {
    defaults: Value,
}

impl DefaultMappingsSynchronizer {
    /// Use the embedded baseline.
    pub fn new() -> Result<Self> {
        Ok(Self::with_defaults(serde_yaml::from_str(DEFAULT_MAPPING)?))
    }

    pub fn with_defaults(defaults: Value) -> Self {
        Self { defaults }
    }
}

impl Synchronizer for DefaultMappingsSynchronizer {
    fn name(&self) -> &str {
        "default_mappings"
    }

    fn sync(&self, mapping: Mapping, settings: Settings) -> Result<(Mapping, Settings)> {
        let merged = tree::merge(mapping.to_value()?, [&self.defaults]);
        Ok((Mapping::from_value(merged)?, settings))
    }
}

/// Fills index settings from a baseline. Both sides are dot-expanded first.
pub struct DefaultSettingsSynchronizer {
    defaults: Settings,
}

impl DefaultSettingsSynchronizer {
    /// Use the embedded baseline.
    pub fn new() -> Result<Self> {
        let value: Value = serde_yaml::from_str(DEFAULT_SETTINGS)?;
        Self::with_defaults(Settings::try_from(value)?)
    }

    pub fn with_defaults(defaults: Settings) -> Result<Self> {
        Ok(Self {
            defaults: defaults.expand()?,
        })
    }
}

impl Synchronizer for DefaultSettingsSynchronizer {
    fn name(&self) -> &str {
        "default_settings"
    }

    fn sync(&self, mapping: Mapping, settings: Settings) -> Result<(Mapping, Settings)> {
        Ok((mapping, settings.with_defaults(&self.defaults)?))
    }
}
