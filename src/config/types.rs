//! Configuration types and structures.

use crate::extraction::{DescriptionsPolicy, FailurePolicy, LoadOptions};
use crate::sync::{DEFAULT_EXCLUDED_PROPERTIES, DEFAULT_NORMALIZER, DescriptionTarget};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Elasticsearch endpoint.
pub const DEFAULT_ES_URL: &str = "http://localhost:9200";

/// Model loading behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// How `descriptions.yaml` is attached: `wrap` (default) or `require_meta`.
    #[serde(default)]
    pub descriptions: DescriptionsPolicy,

    /// What a broken doc-type does to the load: `isolate` (default) or `abort`.
    #[serde(default)]
    pub failures: FailurePolicy,
}

impl LoaderConfig {
    pub fn load_options(&self, include_vestigial: bool) -> LoadOptions {
        LoadOptions {
            include_vestigial,
            descriptions: self.descriptions,
            failures: self.failures,
        }
    }
}

/// Keyword normalizer injected during sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_normalizer_name")]
    pub name: String,

    /// Field names that keep case-sensitive matching.
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            name: default_normalizer_name(),
            excluded: default_excluded(),
        }
    }
}

fn default_normalizer_name() -> String {
    DEFAULT_NORMALIZER.to_string()
}

fn default_excluded() -> Vec<String> {
    DEFAULT_EXCLUDED_PROPERTIES
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Connection to the index service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    #[serde(default = "default_es_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// PEM bundle of extra CA certificates to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout (default: 60).
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Delay between force-merge progress checks (default: 10).
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_es_url(),
            user: None,
            password: None,
            ca_cert: None,
            timeout_seconds: default_timeout_seconds(),
            poll_interval_seconds: default_poll_interval_seconds(),
        }
    }
}

fn default_es_url() -> String {
    DEFAULT_ES_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_poll_interval_seconds() -> u64 {
    10
}

/// A sync policy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    DefaultMappings,
    DefaultSettings,
    Normalizer,
    Autocomplete,
    Descriptions,
}

/// Autocomplete field and the fields copied into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteConfig {
    pub field: String,
    pub sources: Vec<String>,
}

/// Sync pipeline for one index or doc-type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_steps")]
    pub steps: Vec<StepKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<AutocompleteConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<DescriptionTarget>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            autocomplete: None,
            descriptions: Vec::new(),
        }
    }
}

fn default_steps() -> Vec<StepKind> {
    vec![
        StepKind::DefaultMappings,
        StepKind::DefaultSettings,
        StepKind::Normalizer,
    ]
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one sub-directory per index.
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Data dictionary used by the descriptions step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<PathBuf>,

    /// Pipelines keyed by `index` or `index/doc_type`.
    #[serde(default)]
    pub pipelines: IndexMap<String, PipelineConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            loader: LoaderConfig::default(),
            normalizer: NormalizerConfig::default(),
            elasticsearch: ElasticsearchConfig::default(),
            dictionary: None,
            pipelines: IndexMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a single file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// The pipeline for a doc-type: `index/doc_type` first, then `index`,
    /// then the default steps.
    pub fn pipeline(&self, index: &str, doc_type: &str) -> PipelineConfig {
        self.pipelines
            .get(&format!("{}/{}", index, doc_type))
            .or_else(|| self.pipelines.get(index))
            .cloned()
            .unwrap_or_default()
    }
}
