//! Init-index subcommand: create search indices from the models.

use super::ServiceArgs;
use crate::service::{InitOutcome, InitRequest};
use clap::Args;
use std::io::{BufRead, Write};

/// Arguments for the init-index subcommand
#[derive(Args, Debug)]
pub struct InitIndexArgs {
    /// Model indices to initialize
    #[arg(long = "index", value_name = "INDEX", num_args = 1.., required = true)]
    pub indices: Vec<String>,

    /// Aliases, one per index
    #[arg(long = "alias", value_name = "ALIAS", num_args = 1..)]
    pub aliases: Vec<String>,

    /// Prefix for the index name, e.g. gdc_r52
    #[arg(long)]
    pub prefix: String,

    /// Delete an existing index with the same name (asks for confirmation)
    #[arg(long)]
    pub delete: bool,

    #[command(flatten)]
    pub service: ServiceArgs,
}

impl InitIndexArgs {
    pub fn init_request(&self) -> InitRequest {
        InitRequest {
            indices: self.indices.clone(),
            aliases: self.aliases.clone(),
            prefix: self.prefix.clone(),
            delete: self.delete,
        }
    }
}

/// Ask on `output` and read the answer from `input`; the user must type the
/// index name exactly.
pub fn confirm_delete(index: &str, input: &mut impl BufRead, output: &mut impl Write) -> bool {
    let prompt = format!(
        "Confirm deleting existing {} index by typing the index name: ",
        index
    );
    if output
        .write_all(prompt.as_bytes())
        .and_then(|_| output.flush())
        .is_err()
    {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => answer.trim_end_matches(['\r', '\n']) == index,
        Err(_) => false,
    }
}

pub fn render_outcome(outcome: &InitOutcome) -> String {
    let mut out = String::new();
    for name in &outcome.deleted {
        out.push_str(&format!("deleted {}\n", name));
    }
    for name in &outcome.created {
        out.push_str(&format!("created {}\n", name));
    }
    for name in &outcome.kept {
        out.push_str(&format!("kept    {}\n", name));
    }
    for (alias, index) in &outcome.aliases {
        out.push_str(&format!("alias   {} -> {}\n", alias, index));
    }
    for name in &outcome.unknown {
        out.push_str(&format!("unknown {}\n", name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: InitIndexArgs,
    }

    #[test]
    fn test_parse_args() {
        let h = Harness::parse_from([
            "init-index",
            "--index",
            "case_set",
            "file_set",
            "--alias",
            "cases",
            "files",
            "--prefix",
            "gdc_r52",
            "--url",
            "http://es:9200",
        ]);
        let request = h.args.init_request();
        assert_eq!(request.indices, vec!["case_set", "file_set"]);
        assert_eq!(request.aliases, vec!["cases", "files"]);
        assert_eq!(request.prefix, "gdc_r52");
        assert!(!request.delete);
        assert_eq!(h.args.service.url.as_deref(), Some("http://es:9200"));
    }

    #[test]
    fn test_confirm_delete_requires_exact_name() {
        let mut prompt = Vec::new();
        assert!(confirm_delete("p_case", &mut "p_case\n".as_bytes(), &mut prompt));
        assert!(String::from_utf8(prompt).unwrap().contains("p_case index"));

        assert!(!confirm_delete("p_case", &mut "p_cas\n".as_bytes(), &mut Vec::new()));
        assert!(!confirm_delete("p_case", &mut "".as_bytes(), &mut Vec::new()));
    }

    #[test]
    fn test_render_outcome() {
        let outcome = InitOutcome {
            created: vec!["p_case".to_string()],
            aliases: vec![("cases".to_string(), "p_case".to_string())],
            ..Default::default()
        };
        assert_eq!(
            render_outcome(&outcome),
            "created p_case\nalias   cases -> p_case\n"
        );
    }
}
