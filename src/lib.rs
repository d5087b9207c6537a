//! Search index models stored as YAML.
//!
//! This module exports the core components: loading model definitions from a
//! directory, merging and diffing mapping trees, selecting sub-mappings,
//! running policy pipelines, and writing back canonical mappings with their
//! vestigial deltas.

pub mod cli;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod models;
pub mod service;
pub mod sync;
pub mod tree;

pub use error::{Error, ErrorCode, Result};
