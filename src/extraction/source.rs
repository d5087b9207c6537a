//! Where definitions come from.
//!
//! A models directory holds one directory per index, in one of these shapes:
//!
//! ```text
//! index/                     index/                    index/
//!   mapping.yaml               doc_type/                 doc_type.mapping.yaml
//!   vestigial.yaml?              mapping.yaml            settings.yaml?
//!   settings.yaml?               vestigial.yaml?         descriptions.yaml?
//!   descriptions.yaml?         settings.yaml?
//!                              descriptions.yaml?
//! ```
//!
//! The first makes the index its own single doc-type. The last is the legacy
//! flat shape, where each `<doc_type>.mapping.yaml` is a doc-type.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAPPING_FILE: &str = "mapping.yaml";
pub const VESTIGIAL_FILE: &str = "vestigial.yaml";
pub const SETTINGS_FILE: &str = "settings.yaml";
pub const DESCRIPTIONS_FILE: &str = "descriptions.yaml";
const LEGACY_MAPPING_SUFFIX: &str = ".mapping.yaml";

/// Locations of one doc-type's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTypeLayout {
    pub name: String,
    pub mapping: PathBuf,
    pub vestigial: Option<PathBuf>,
}

/// Locations of one index's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    pub name: String,
    pub settings: PathBuf,
    pub descriptions: PathBuf,
    pub doc_types: Vec<DocTypeLayout>,
}

/// Provides raw definition documents.
pub trait DefinitionSource {
    /// Discover all indices and their doc-types.
    fn indices(&self) -> Result<Vec<IndexLayout>>;

    /// Read a document. `Ok(None)` when it does not exist.
    fn read(&self, location: &Path) -> Result<Option<String>>;
}

/// Definitions stored under a models directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_layout(&self, name: String, dir: &Path) -> Result<IndexLayout> {
        let mut layout = IndexLayout {
            settings: dir.join(SETTINGS_FILE),
            descriptions: dir.join(DESCRIPTIONS_FILE),
            doc_types: Vec::new(),
            name,
        };

        let single = dir.join(MAPPING_FILE);
        if single.is_file() {
            layout.doc_types.push(DocTypeLayout {
                name: layout.name.clone(),
                mapping: single,
                vestigial: Some(dir.join(VESTIGIAL_FILE)),
            });
            return Ok(layout);
        }

        for entry in sorted_entries(dir)? {
            let Some(file_name) = entry.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };

            if entry.is_dir() {
                let mapping = entry.join(MAPPING_FILE);
                if mapping.is_file() {
                    layout.doc_types.push(DocTypeLayout {
                        name: file_name,
                        mapping,
                        vestigial: Some(entry.join(VESTIGIAL_FILE)),
                    });
                } else {
                    debug!(path = %entry.display(), "Skipping directory without a mapping");
                }
            } else if let Some(doc_type) = file_name.strip_suffix(LEGACY_MAPPING_SUFFIX) {
                // A doc-type directory takes precedence over a legacy file.
                if layout.doc_types.iter().any(|d| d.name == doc_type) {
                    continue;
                }
                layout.doc_types.push(DocTypeLayout {
                    name: doc_type.to_string(),
                    mapping: entry.clone(),
                    vestigial: None,
                });
            }
        }

        Ok(layout)
    }
}

impl DefinitionSource for DirectorySource {
    fn indices(&self) -> Result<Vec<IndexLayout>> {
        let mut indices = Vec::new();
        for entry in sorted_entries(&self.root)? {
            if !entry.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let layout = self.index_layout(name.to_string(), &entry)?;
            if layout.doc_types.is_empty() {
                debug!(index = %layout.name, "Skipping index directory without mappings");
                continue;
            }
            indices.push(layout);
        }
        Ok(indices)
    }

    fn read(&self, location: &Path) -> Result<Option<String>> {
        if !location.is_file() {
            return Ok(None);
        }
        debug!(path = %location.display(), "Reading definition");
        fs::read_to_string(location)
            .map(Some)
            .map_err(|e| Error::io(location, e))
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(dir, e))?;
    entries.sort();
    Ok(entries)
}
