//! Force-merge subcommand.

use super::ServiceArgs;
use clap::Args;

/// Arguments for the force-merge subcommand
#[derive(Args, Debug)]
pub struct ForceMergeArgs {
    /// Indices to merge
    #[arg(value_name = "INDEX", required = true)]
    pub indices: Vec<String>,

    /// Number of segments each shard is merged into
    #[arg(long, default_value_t = 1)]
    pub max_segments: u32,

    #[command(flatten)]
    pub service: ServiceArgs,
}
