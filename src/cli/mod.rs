//! CLI command definitions for esmodels
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod diff;
pub mod force_merge;
pub mod init_index;
pub mod select;
pub mod show;
pub mod sync;

use crate::config::{Config, ElasticsearchConfig};
use crate::dictionary::{DictionaryLookup, YamlDictionary};
use crate::extraction::{DirectorySource, ModelCache};
use crate::logging::LogTarget;
use crate::sync::PipelineBuilder;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use diff::DiffArgs;
use force_merge::ForceMergeArgs;
use init_index::InitIndexArgs;
use select::SelectArgs;
use show::ShowArgs;
use std::path::PathBuf;
use std::sync::Arc;
use sync::SyncArgs;

/// Search index models: inspect, sync, and deploy mappings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the models directory (overrides config)
    #[arg(short, long, global = true)]
    pub models_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: LogTarget,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the loaded settings and mappings of an index
    Show(ShowArgs),

    /// Select the mapping of a field relative to another doc-type
    Select(SelectArgs),

    /// Show what a sync would change without writing anything
    Diff(DiffArgs),

    /// Apply the policy pipeline and rewrite the model files
    Sync(SyncArgs),

    /// Create search indices (and aliases) from the models
    InitIndex(InitIndexArgs),

    /// Force a merge on the shards of one or more indices
    ForceMerge(ForceMergeArgs),
}

/// Connection options for the index service (override config)
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceArgs {
    /// Service base URL, e.g. http://localhost:9200
    #[arg(long)]
    pub url: Option<String>,

    /// Service user
    #[arg(long)]
    pub user: Option<String>,

    /// Service password
    #[arg(long)]
    pub password: Option<String>,

    /// Path to a CA certificate bundle for TLS
    #[arg(long = "ssl-ca", value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,
}

impl ServiceArgs {
    /// Merge these flags over the configured connection.
    pub fn resolve(&self, config: &ElasticsearchConfig) -> ElasticsearchConfig {
        let mut resolved = config.clone();
        if let Some(url) = &self.url {
            resolved.url = url.clone();
        }
        if let Some(user) = &self.user {
            resolved.user = Some(user.clone());
        }
        if let Some(password) = &self.password {
            resolved.password = Some(password.clone());
        }
        if let Some(ca_cert) = &self.ca_cert {
            resolved.ca_cert = Some(ca_cert.clone());
        }
        resolved
    }
}

/// Model cache over the configured models directory.
pub fn open_cache(config: &Config) -> ModelCache<DirectorySource> {
    ModelCache::new(
        DirectorySource::new(config.models_dir.clone()),
        config.loader.load_options(true),
    )
}

/// Pipeline builder with the configured dictionary, if any.
pub fn pipeline_builder(config: &Config) -> Result<PipelineBuilder<'_>> {
    let builder = PipelineBuilder::new(config);
    match &config.dictionary {
        Some(path) => {
            let dictionary = YamlDictionary::load(path)
                .with_context(|| format!("Failed to load dictionary {}", path.display()))?;
            let dictionary: Arc<dyn DictionaryLookup> = Arc::new(dictionary);
            Ok(builder.with_dictionary(dictionary))
        }
        None => Ok(builder),
    }
}
