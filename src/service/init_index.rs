//! Create search indices from the loaded models.

use super::IndexService;
use crate::models::Models;
use crate::{Error, Result};
use tracing::{info, warn};

/// What to initialize.
#[derive(Debug, Clone, Default)]
pub struct InitRequest {
    /// Model index names.
    pub indices: Vec<String>,
    /// Optional aliases, one per entry of `indices`.
    pub aliases: Vec<String>,
    /// Prefix for the created index names (e.g. a release tag).
    pub prefix: String,
    /// Delete an existing index of the same name (after confirmation).
    pub delete: bool,
}

/// Summary of an [`init_index`] run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitOutcome {
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    /// Existing indices left in place.
    pub kept: Vec<String>,
    /// Requested names with no model.
    pub unknown: Vec<String>,
    /// `(alias, index)` pairs that were created.
    pub aliases: Vec<(String, String)>,
}

/// Name of the index created for one doc-type.
///
/// Single doc-type indices (doc-type named after the index) get
/// `<prefix>_<index>`, others `<prefix>_<index>_<doc_type>`.
pub fn full_index_name(prefix: &str, index: &str, doc_type: &str) -> String {
    if doc_type.is_empty() || doc_type == index {
        format!("{}_{}", prefix, index)
    } else {
        format!("{}_{}_{}", prefix, index, doc_type)
    }
}

/// Create one search index per doc-type of every requested model index.
///
/// `models` should be loaded without vestigial fields. `confirm` receives
/// the full name of an existing index before it is deleted and must return
/// true to go ahead.
pub fn init_index(
    models: &Models,
    service: &dyn IndexService,
    request: &InitRequest,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<InitOutcome> {
    if request.prefix.is_empty() {
        return Err(Error::InvalidArgument(
            "a prefix for the index name is required, e.g. 'gdc_r52'".to_string(),
        ));
    }
    if !request.aliases.is_empty() && request.aliases.len() != request.indices.len() {
        return Err(Error::InvalidArgument(format!(
            "mismatching arguments for index: {:?} and alias: {:?}",
            request.indices, request.aliases
        )));
    }

    let mut outcome = InitOutcome::default();

    for (position, name) in request.indices.iter().enumerate() {
        let Ok(index) = models.index(name) else {
            info!("Specified index '{}' is not defined in models, skipping it", name);
            outcome.unknown.push(name.clone());
            continue;
        };

        let mut created = 0;
        let mut last_name = None;
        for model in index.models() {
            let full_name = full_index_name(&request.prefix, name, model.doc_type_name());
            last_name = Some(full_name.clone());

            if service.index_exists(&full_name)? {
                if !request.delete {
                    info!(
                        "Index '{}' exists, delete not requested, skipping",
                        full_name
                    );
                    outcome.kept.push(full_name);
                    continue;
                }
                if !confirm(&full_name) {
                    info!("Index name mismatch, skipping deleting '{}'", full_name);
                    outcome.kept.push(full_name);
                    continue;
                }
                info!("Deleting existing index '{}'", full_name);
                service.delete_index(&full_name)?;
                outcome.deleted.push(full_name.clone());
            }

            info!("Creating index '{}'", full_name);
            service.create_index(&full_name, model.settings(), model.mapping())?;
            outcome.created.push(full_name);
            created += 1;
        }

        let Some(alias) = request.aliases.get(position) else {
            continue;
        };
        let Some(target) = last_name else {
            continue;
        };
        if !service.index_exists(&target)? {
            warn!(
                "Index '{}' not created so alias '{}' will not be created",
                name, alias
            );
            continue;
        }
        if created > 1 {
            warn!(
                "Cannot create alias '{}' because {} indices were created for '{}'",
                alias, created, name
            );
            continue;
        }
        if service.alias_exists(alias)? {
            warn!("Alias '{}' exists already, skipping", alias);
            continue;
        }
        service.put_alias(alias, &target)?;
        outcome.aliases.push((alias.clone(), target));
    }

    Ok(outcome)
}
