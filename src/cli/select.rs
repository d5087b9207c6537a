//! Select subcommand: locate a field's mapping inside another doc-type.

use super::show::OutputFormat;
use crate::models::{Models, Selected, Selector};
use anyhow::Result;
use clap::Args;

/// Arguments for the select subcommand
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Index name
    pub index: String,

    /// Doc-type to search in
    pub doc_type: String,

    /// Field (or doc-type) to select
    pub field: String,

    /// Only consider paths running through this parent property
    #[arg(long, value_name = "NAME")]
    pub parent: Option<String>,

    /// Output format: yaml (default) or json
    #[arg(short, long, default_value = "yaml", value_name = "FORMAT")]
    pub format: OutputFormat,
}

pub fn render_select(models: &Models, args: &SelectArgs) -> Result<String> {
    let model = models.model(&args.index, &args.doc_type)?;
    let selector = args.parent.as_deref().map(Selector::parent);
    let selected = model.select_mapping(&args.field, selector.as_ref())?;

    let mut out = String::new();
    if let Selected::Property { path, .. } = &selected {
        out.push_str(&format!("# {}\n", path));
    }
    out.push_str(&args.format.render(&selected.to_value()?)?);
    Ok(out)
}
