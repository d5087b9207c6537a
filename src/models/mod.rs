//! In-memory model set: indices, their settings, and doc-type mappings.

mod property;
mod select;
mod settings;
pub mod walk;

pub use property::{FieldType, Mapping, Meta, Properties, Property};
pub use select::{Selected, Selector};
pub use settings::Settings;
pub use walk::Walk;

use crate::error::{Error, Result};
use indexmap::IndexMap;

/// One document type of an index.
#[derive(Debug, Clone, PartialEq)]
pub struct DocType {
    pub name: String,
    pub mapping: Mapping,
}

impl DocType {
    pub fn new(name: impl Into<String>, mapping: Mapping) -> Self {
        DocType {
            name: name.into(),
            mapping,
        }
    }
}

/// An index: shared settings and its doc-types in load order.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub settings: Settings,
    doc_types: IndexMap<String, DocType>,
}

impl Index {
    pub fn new(name: impl Into<String>, settings: Settings) -> Self {
        Index {
            name: name.into(),
            settings,
            doc_types: IndexMap::new(),
        }
    }

    pub fn insert_doc_type(&mut self, doc_type: DocType) {
        self.doc_types.insert(doc_type.name.clone(), doc_type);
    }

    pub fn doc_type(&self, name: &str) -> Option<&DocType> {
        self.doc_types.get(name)
    }

    pub fn doc_types(&self) -> impl Iterator<Item = &DocType> {
        self.doc_types.values()
    }

    pub fn doc_type_names(&self) -> impl Iterator<Item = &str> {
        self.doc_types.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.doc_types.is_empty()
    }

    /// Whether the single doc-type shares the index name, which decides the
    /// on-disk layout.
    pub fn is_single_layout(&self) -> bool {
        self.doc_types.len() == 1 && self.doc_types.contains_key(&self.name)
    }

    pub fn model(&self, doc_type: &str) -> Result<ModelRef<'_>> {
        let doc_type = self
            .doc_types
            .get(doc_type)
            .ok_or_else(|| Error::doc_type_not_found(&self.name, doc_type))?;
        Ok(ModelRef {
            index: self,
            doc_type,
        })
    }

    pub fn models(&self) -> impl Iterator<Item = ModelRef<'_>> {
        self.doc_types.values().map(move |doc_type| ModelRef {
            index: self,
            doc_type,
        })
    }
}

/// All loaded indices keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Models {
    indices: IndexMap<String, Index>,
}

impl Models {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: Index) {
        self.indices.insert(index.name.clone(), index);
    }

    pub fn index(&self, name: &str) -> Result<&Index> {
        self.indices
            .get(name)
            .ok_or_else(|| Error::index_not_found(name))
    }

    pub fn model(&self, index: &str, doc_type: &str) -> Result<ModelRef<'_>> {
        self.index(index)?.model(doc_type)
    }

    pub fn indices(&self) -> impl Iterator<Item = &Index> {
        self.indices.values()
    }

    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Read-only view of one doc-type together with its index.
#[derive(Debug, Clone, Copy)]
pub struct ModelRef<'a> {
    index: &'a Index,
    doc_type: &'a DocType,
}

impl<'a> ModelRef<'a> {
    pub fn index_name(&self) -> &'a str {
        &self.index.name
    }

    pub fn doc_type_name(&self) -> &'a str {
        &self.doc_type.name
    }

    pub fn mapping(&self) -> &'a Mapping {
        &self.doc_type.mapping
    }

    pub fn settings(&self) -> &'a Settings {
        &self.index.settings
    }
}
