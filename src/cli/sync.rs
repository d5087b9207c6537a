//! Sync subcommand: run the policy pipeline and rewrite model files.

use crate::sync::{SyncOutcome, SyncRequest};
use clap::Args;

/// Arguments for the sync subcommand
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Indices to sync (default: all)
    #[arg(short, long = "index", value_name = "INDEX", num_args = 1..)]
    pub indices: Vec<String>,

    /// Doc-types to sync (default: all of the selected indices)
    #[arg(short, long = "doc-type", value_name = "DOC_TYPE", num_args = 1..)]
    pub doc_types: Vec<String>,

    /// Compute everything but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn sync_request(&self) -> SyncRequest {
        SyncRequest {
            indices: self.indices.clone(),
            doc_types: self.doc_types.clone(),
            dry_run: self.dry_run,
        }
    }
}

/// One line per synced doc-type.
pub fn render_outcomes(outcomes: &[SyncOutcome]) -> String {
    if outcomes.is_empty() {
        return "Nothing to sync.\n".to_string();
    }

    let mut out = String::new();
    for outcome in outcomes {
        let verb = if outcome.dry_run { "would write" } else { "wrote" };
        let vestigial = if outcome.mapping_changed() {
            format!("{} vestigial", outcome.delta.added().len())
        } else {
            "unchanged".to_string()
        };
        out.push_str(&format!(
            "{}/{}: mapping {}, {} {} file(s)\n",
            outcome.index,
            outcome.doc_type,
            vestigial,
            verb,
            outcome.files.len()
        ));
        for file in &outcome.files {
            out.push_str(&format!("  {}\n", file.display()));
        }
    }
    out
}
