//! Diff subcommand for esmodels CLI
//!
//! Shows, per doc-type, the delta a sync would record between the new
//! canonical mapping and what is loaded today.

use crate::sync::{SyncOutcome, SyncRequest};
use crate::tree::Delta;
use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value, json};

/// Arguments for the diff subcommand
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Index name
    pub index: String,

    /// Doc-type (default: every doc-type of the index)
    pub doc_type: Option<String>,

    /// Output format: text (default), json, or summary
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub format: DiffFormat,
}

/// Output format for diff results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiffFormat {
    #[default]
    Text,
    Json,
    Summary,
}

impl std::str::FromStr for DiffFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(DiffFormat::Text),
            "json" => Ok(DiffFormat::Json),
            "summary" => Ok(DiffFormat::Summary),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: text, json, summary",
                s
            )),
        }
    }
}

impl std::fmt::Display for DiffFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffFormat::Text => write!(f, "text"),
            DiffFormat::Json => write!(f, "json"),
            DiffFormat::Summary => write!(f, "summary"),
        }
    }
}

impl DiffArgs {
    /// The dry-run sync that computes the deltas.
    pub fn sync_request(&self) -> SyncRequest {
        SyncRequest {
            indices: vec![self.index.clone()],
            doc_types: self.doc_type.iter().cloned().collect(),
            dry_run: true,
        }
    }
}

fn delta_json(delta: &Delta) -> Value {
    let added: Map<String, Value> = delta
        .added()
        .iter()
        .map(|(path, value)| (path.to_string(), value.clone()))
        .collect();
    let removed: Map<String, Value> = delta
        .removed()
        .iter()
        .map(|(path, value)| (path.to_string(), value.clone()))
        .collect();
    let changed: Map<String, Value> = delta
        .changed()
        .iter()
        .map(|(path, change)| {
            (
                path.to_string(),
                json!({"old_value": change.old_value, "new_value": change.new_value}),
            )
        })
        .collect();
    json!({"added": added, "removed": removed, "changed": changed})
}

fn summary_line(outcome: &SyncOutcome) -> String {
    let delta = &outcome.delta;
    format!(
        "  {}/{}: +{} -{} ~{}",
        outcome.index,
        outcome.doc_type,
        delta.added().len(),
        delta.removed().len(),
        delta.changed().len()
    )
}

pub fn render_diff(outcomes: &[SyncOutcome], format: DiffFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        DiffFormat::Text => {
            for outcome in outcomes {
                out.push_str(&format!("=== {}/{} ===\n", outcome.index, outcome.doc_type));
                out.push_str(&outcome.delta.to_string());
                out.push('\n');
            }
        }
        DiffFormat::Json => {
            let entries: Vec<Value> = outcomes
                .iter()
                .map(|outcome| {
                    json!({
                        "index": outcome.index,
                        "doc_type": outcome.doc_type,
                        "delta": delta_json(&outcome.delta),
                        "files": outcome.files,
                    })
                })
                .collect();
            out.push_str(&serde_json::to_string_pretty(&entries)?);
            out.push('\n');
        }
        DiffFormat::Summary => {
            let total: usize = outcomes.iter().map(|o| o.delta.len()).sum();
            if total == 0 {
                out.push_str("No differences found.\n");
            } else {
                for outcome in outcomes {
                    out.push_str(&summary_line(outcome));
                    out.push('\n');
                }
                out.push_str(&format!("Total: {} changes\n", total));
            }
        }
    }
    Ok(out)
}
