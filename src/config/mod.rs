//! Tiered configuration.
//!
//! Merged field-by-field from lowest to highest priority:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `./esmodels.yaml`
//! 3. **User** - `~/.esmodels/config.yaml`
//! 4. **Environment** - `ESMODELS_MODELS_DIR`, `ESMODELS_ES_URL`
//!
//! `ESMODELS_CONFIG_PATH` (or `--config`) names a single file that replaces
//! the project and user tiers.

mod loader;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, ENV_CONFIG_PATH, ENV_ES_URL, ENV_MODELS_DIR};
pub use types::*;
