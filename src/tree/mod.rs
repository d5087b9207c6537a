//! Generic tree engines over `serde_json::Value`: additive merge and
//! reversible structural deltas.

mod delta;
mod merge;
mod path;

pub use delta::{Change, Delta};
pub use merge::{merge, merge_all};
pub use path::TreePath;
