//! Explicit memoization of full model loads.

use super::loader::{load_models, LoadOptions, LoadReport};
use super::source::DefinitionSource;
use crate::error::Result;
use crate::models::Models;
use std::sync::Arc;

/// Caches one load per vestigial flag. Loaded models are shared read-only;
/// clone before changing anything.
pub struct ModelCache<S> {
    source: S,
    options: LoadOptions,
    with_vestigial: Option<Arc<Models>>,
    without_vestigial: Option<Arc<Models>>,
    last_report: LoadReport,
}

impl<S: DefinitionSource> ModelCache<S> {
    /// `options.include_vestigial` is ignored; it is chosen per call.
    pub fn new(source: S, options: LoadOptions) -> Self {
        Self {
            source,
            options,
            with_vestigial: None,
            without_vestigial: None,
            last_report: LoadReport::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn models(&mut self, include_vestigial: bool) -> Result<Arc<Models>> {
        let slot = if include_vestigial {
            &mut self.with_vestigial
        } else {
            &mut self.without_vestigial
        };
        if let Some(models) = slot.as_ref() {
            return Ok(Arc::clone(models));
        }

        let options = self.options.with_vestigial(include_vestigial);
        let (models, report) = load_models(&self.source, &options)?;
        let models = Arc::new(models);
        *slot = Some(Arc::clone(&models));
        self.last_report = report;
        Ok(models)
    }

    /// Failures from the most recent uncached load.
    pub fn last_report(&self) -> &LoadReport {
        &self.last_report
    }

    /// Drop both cached loads, e.g. after a sync rewrote the files.
    pub fn invalidate(&mut self) {
        self.with_vestigial = None;
        self.without_vestigial = None;
    }
}
