//! Loading models from definition documents.

mod cache;
mod loader;
mod source;

pub use cache::ModelCache;
pub use loader::{
    DescriptionsPolicy, FailurePolicy, LoadFailure, LoadOptions, LoadReport, load_models,
};
pub use source::{
    DESCRIPTIONS_FILE, DefinitionSource, DirectorySource, DocTypeLayout, IndexLayout,
    MAPPING_FILE, SETTINGS_FILE, VESTIGIAL_FILE,
};
