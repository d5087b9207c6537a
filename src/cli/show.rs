//! Show subcommand: print loaded models.

use crate::models::{Index, Models};
use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};

/// Arguments for the show subcommand
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Index name
    pub index: String,

    /// Doc-type (default: every doc-type of the index)
    pub doc_type: Option<String>,

    /// Leave vestigial fields out of the mappings
    #[arg(long)]
    pub no_vestigial: bool,

    /// Output format: yaml (default) or json
    #[arg(short, long, default_value = "yaml", value_name = "FORMAT")]
    pub format: OutputFormat,
}

/// Output format for model documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: yaml, json",
                s
            )),
        }
    }
}

impl OutputFormat {
    pub fn render(&self, value: &Value) -> Result<String> {
        Ok(match self {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(value)?),
        })
    }
}

/// `{doc_type: {settings, mappings}}` for the selected doc-types.
fn index_document(index: &Index, doc_type: Option<&str>) -> Result<Value> {
    let mut document = Map::new();
    for model in index.models() {
        if doc_type.is_some_and(|d| d != model.doc_type_name()) {
            continue;
        }
        let mut entry = Map::new();
        entry.insert("settings".to_string(), model.settings().clone().into_value());
        entry.insert("mappings".to_string(), model.mapping().to_value()?);
        document.insert(model.doc_type_name().to_string(), Value::Object(entry));
    }
    Ok(Value::Object(document))
}

/// Render the requested index (and doc-type) from `models`.
pub fn render_show(models: &Models, args: &ShowArgs) -> Result<String> {
    let index = models.index(&args.index)?;
    if let Some(doc_type) = &args.doc_type {
        // Fail with a clear message rather than printing `{}`.
        index.model(doc_type)?;
    }
    let document = index_document(index, args.doc_type.as_deref())?;
    args.format.render(&document)
}
