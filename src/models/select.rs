//! Selecting a sub-mapping by field name.

use super::property::{Mapping, Property};
use super::walk::Walk;
use super::ModelRef;
use crate::error::{Error, Result};

/// Narrows the candidate paths when a field name occurs more than once.
pub enum Selector {
    /// Keep paths that run through a parent property with this name.
    Parent(String),
    /// Arbitrary filter over the candidate paths, in walk order.
    Filter(Box<dyn Fn(Vec<String>) -> Vec<String>>),
}

impl Selector {
    pub fn parent(name: impl Into<String>) -> Self {
        Selector::Parent(name.into())
    }

    pub fn filter(f: impl Fn(Vec<String>) -> Vec<String> + 'static) -> Self {
        Selector::Filter(Box::new(f))
    }

    fn apply(&self, candidates: Vec<String>) -> Vec<String> {
        match self {
            Selector::Parent(name) => {
                let pattern = format!(r"\.{}\.", regex_lite::escape(name));
                match regex_lite::Regex::new(&pattern) {
                    Ok(re) => candidates.into_iter().filter(|p| re.is_match(p)).collect(),
                    Err(_) => Vec::new(),
                }
            }
            Selector::Filter(f) => f(candidates),
        }
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Parent(name) => f.debug_tuple("Parent").field(name).finish(),
            Selector::Filter(_) => f.write_str("Filter(..)"),
        }
    }
}

/// Result of a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selected<'a> {
    /// The doc-type itself was requested.
    Mapping(&'a Mapping),
    /// A single property found by name.
    Property { path: String, property: &'a Property },
}

impl Selected<'_> {
    /// The selected subtree as a generic value.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Selected::Mapping(mapping) => serde_json::to_value(mapping)?,
            Selected::Property { property, .. } => serde_json::to_value(property)?,
        })
    }
}

impl<'a> ModelRef<'a> {
    /// Select the subtree for `target`.
    ///
    /// Returns the whole mapping when the doc-type is `target` or
    /// `<target>_centric`. Otherwise every property named `target` is a
    /// candidate; the selector narrows them and exactly one must remain.
    pub fn select_mapping(&self, target: &str, selector: Option<&Selector>) -> Result<Selected<'a>> {
        let mapping = self.mapping();
        let doc_type = self.doc_type_name();
        if doc_type == target || doc_type == format!("{}_centric", target) {
            return Ok(Selected::Mapping(mapping));
        }

        let suffix = format!(".{}", target);
        let matches: Vec<(String, &'a Property)> = Walk::new(&mapping.properties)
            .filter(|(path, _)| path.ends_with(&suffix))
            .collect();

        let candidates: Vec<String> = matches.iter().map(|(path, _)| path.clone()).collect();
        let mut selected = match selector {
            Some(selector) => selector.apply(candidates),
            None => candidates,
        };

        if selected.len() != 1 {
            tracing::debug!(
                field = target,
                candidates = selected.len(),
                "Selection did not resolve to a single property"
            );
            return Err(Error::AmbiguousSelection {
                field: target.to_string(),
                candidates: selected,
            });
        }

        let path = selected.remove(0);
        // A filter may return paths that were never candidates.
        let property = matches
            .into_iter()
            .find(|(candidate, _)| *candidate == path)
            .map(|(_, property)| property)
            .ok_or_else(|| Error::FieldNotFound { path: path.clone() })?;
        Ok(Selected::Property { path, property })
    }
}
