//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::types::Config;
use crate::tree;
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Explicit config file; replaces the file tiers.
pub const ENV_CONFIG_PATH: &str = "ESMODELS_CONFIG_PATH";
pub const ENV_MODELS_DIR: &str = "ESMODELS_MODELS_DIR";
pub const ENV_ES_URL: &str = "ESMODELS_ES_URL";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config (./esmodels.yaml)
    Project = 1,
    /// User-level config (~/.esmodels/config.yaml)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Files for each configuration tier.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_file: Option<PathBuf>,
    pub user_file: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    pub fn discover() -> Self {
        Self {
            project_file: Some(PathBuf::from("esmodels.yaml")),
            user_file: dirs::home_dir().map(|h| h.join(".esmodels").join("config.yaml")),
        }
    }

    pub fn with_files(project_file: Option<PathBuf>, user_file: Option<PathBuf>) -> Self {
        Self {
            project_file,
            user_file,
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    /// Files that contributed, highest tier last.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), None, |key| std::env::var(key).ok())
    }

    /// Load with explicit paths, an optional explicit file (which replaces
    /// the file tiers), and an environment lookup.
    pub fn load_with(
        paths: ConfigPaths,
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| env(ENV_CONFIG_PATH).map(PathBuf::from));

        if let Some(path) = explicit {
            let mut config = Config::load(&path)?;
            Self::apply_env_overrides(&mut config, &env);
            return Ok(Self {
                config,
                sources: vec![(ConfigTier::User, path)],
            });
        }

        let mut sources = Vec::new();
        // Highest tier first: the merge keeps values already present.
        let mut configs: Vec<Value> = Vec::new();

        for (tier, file) in [
            (ConfigTier::User, &paths.user_file),
            (ConfigTier::Project, &paths.project_file),
        ] {
            let Some(file) = file else { continue };
            if let Some(value) = read_tier(file) {
                debug!(%tier, path = %file.display(), "Loaded config tier");
                configs.push(value);
                sources.push((tier, file.clone()));
            }
        }

        configs.push(serde_json::to_value(Config::default())?);

        let merged = tree::merge_all(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        Self::apply_env_overrides(&mut config, &env);
        sources.reverse();

        Ok(Self { config, sources })
    }

    fn apply_env_overrides(config: &mut Config, env: &impl Fn(&str) -> Option<String>) {
        if let Some(models_dir) = env(ENV_MODELS_DIR) {
            config.models_dir = PathBuf::from(models_dir);
        }

        if let Some(url) = env(ENV_ES_URL) {
            config.elasticsearch.url = url;
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

fn read_tier(file: &Path) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %file.display(), error = %e, "Could not read config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %file.display(), error = %e, "Ignoring unparseable config file");
            None
        }
    }
}
