//! Turning raw definitions into [`Models`].

use super::source::{DefinitionSource, DocTypeLayout, IndexLayout};
use crate::error::{Error, Result};
use crate::models::{DocType, Index, Mapping, Models, Settings};
use crate::tree::Delta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// How an index-level descriptions document is attached to mappings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionsPolicy {
    /// Any non-empty document becomes `_meta.descriptions`.
    #[default]
    Wrap,
    /// Only a document with a top-level `_meta` key is used, and that value
    /// becomes the mapping's `_meta`.
    RequireMeta,
}

/// What happens when one index or doc-type fails to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log, record in the [`LoadReport`], and keep loading the rest.
    #[default]
    Isolate,
    /// Stop at the first failure.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub include_vestigial: bool,
    pub descriptions: DescriptionsPolicy,
    pub failures: FailurePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            include_vestigial: true,
            descriptions: DescriptionsPolicy::default(),
            failures: FailurePolicy::default(),
        }
    }
}

impl LoadOptions {
    pub fn with_vestigial(mut self, include_vestigial: bool) -> Self {
        self.include_vestigial = include_vestigial;
        self
    }
}

/// A unit that was skipped during loading.
#[derive(Debug)]
pub struct LoadFailure {
    pub index: String,
    /// `None` when the whole index failed.
    pub doc_type: Option<String>,
    pub error: Error,
}

/// Failures recorded under [`FailurePolicy::Isolate`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load every index the source provides.
pub fn load_models(
    source: &dyn DefinitionSource,
    options: &LoadOptions,
) -> Result<(Models, LoadReport)> {
    let mut models = Models::new();
    let mut report = LoadReport::default();

    for layout in source.indices()? {
        match load_index(source, &layout, options, &mut report) {
            Ok(index) if index.is_empty() => {
                debug!(index = %layout.name, "No doc-types loaded for index");
            }
            Ok(index) => models.insert(index),
            Err(error) => isolate(options, &mut report, &layout.name, None, error)?,
        }
    }

    debug!(
        indices = models.len(),
        failures = report.failures.len(),
        "Loaded models"
    );
    Ok((models, report))
}

fn isolate(
    options: &LoadOptions,
    report: &mut LoadReport,
    index: &str,
    doc_type: Option<&str>,
    error: Error,
) -> Result<()> {
    if options.failures == FailurePolicy::Abort {
        return Err(error);
    }
    warn!(
        index,
        doc_type = doc_type.unwrap_or("*"),
        error = %error,
        "Skipping definition that failed to load"
    );
    report.failures.push(LoadFailure {
        index: index.to_string(),
        doc_type: doc_type.map(str::to_string),
        error,
    });
    Ok(())
}

fn load_index(
    source: &dyn DefinitionSource,
    layout: &IndexLayout,
    options: &LoadOptions,
    report: &mut LoadReport,
) -> Result<Index> {
    let settings = match read_yaml(source, &layout.settings)? {
        Some(value) => Settings::try_from(value)
            .and_then(Settings::expand)
            .map_err(|e| Error::malformed(&layout.settings, e.to_string()))?,
        None => Settings::new(),
    };
    let meta = match read_yaml(source, &layout.descriptions)? {
        Some(value) => descriptions_meta(value, options.descriptions),
        None => None,
    };

    let mut index = Index::new(&layout.name, settings);
    for doc_type in &layout.doc_types {
        match load_doc_type(source, doc_type, meta.as_ref(), options) {
            Ok(mapping) => index.insert_doc_type(DocType::new(&doc_type.name, mapping)),
            Err(error) => isolate(options, report, &layout.name, Some(&doc_type.name), error)?,
        }
    }
    Ok(index)
}

/// The `_meta` value a descriptions document contributes, if any.
fn descriptions_meta(document: Value, policy: DescriptionsPolicy) -> Option<Value> {
    match policy {
        DescriptionsPolicy::Wrap => {
            let non_empty = document.as_object().is_some_and(|map| !map.is_empty());
            non_empty.then(|| {
                let mut meta = Map::new();
                meta.insert("descriptions".to_string(), document);
                Value::Object(meta)
            })
        }
        DescriptionsPolicy::RequireMeta => match document {
            Value::Object(mut map) => map.shift_remove("_meta"),
            _ => None,
        },
    }
}

fn load_doc_type(
    source: &dyn DefinitionSource,
    layout: &DocTypeLayout,
    meta: Option<&Value>,
    options: &LoadOptions,
) -> Result<Mapping> {
    let mut mapping = read_yaml(source, &layout.mapping)?
        .ok_or_else(|| Error::malformed(&layout.mapping, "mapping document is missing"))?;

    if options.include_vestigial {
        if let Some(path) = &layout.vestigial {
            if let Some(text) = source.read(path)? {
                let delta = Delta::from_yaml(&text)
                    .map_err(|e| Error::malformed(path, e.to_string()))?;
                mapping = delta
                    .apply(mapping)
                    .map_err(|e| Error::malformed(path, e.to_string()))?;
            }
        }
    }

    if let Some(meta) = meta {
        match &mut mapping {
            Value::Object(map) => {
                map.insert("_meta".to_string(), meta.clone());
            }
            _ => return Err(Error::malformed(&layout.mapping, "mapping is not a key/value document")),
        }
    }

    if !mapping.get("properties").is_some_and(Value::is_object) {
        return Err(Error::malformed(&layout.mapping, "missing 'properties'"));
    }

    Mapping::from_value(mapping).map_err(|e| Error::malformed(&layout.mapping, e.to_string()))
}

fn read_yaml(source: &dyn DefinitionSource, path: &Path) -> Result<Option<Value>> {
    let Some(text) = source.read(path)? else {
        return Ok(None);
    };
    let value: Value =
        serde_yaml::from_str(&text).map_err(|e| Error::malformed(path, e.to_string()))?;
    Ok(match value {
        Value::Null => None,
        other => Some(other),
    })
}
