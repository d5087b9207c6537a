//! Document-index service contract and the operations built on it.
//!
//! The library never talks to a search cluster directly; everything goes
//! through [`IndexService`]. [`ElasticsearchClient`] is the HTTP
//! implementation used by the binary, tests substitute their own.

mod elasticsearch;
mod force_merge;
mod init_index;

pub use elasticsearch::ElasticsearchClient;
pub use force_merge::force_merge_and_wait;
pub use init_index::{InitOutcome, InitRequest, full_index_name, init_index};

use crate::Result;
use crate::models::{Mapping, Settings};

/// How a force-merge request returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    /// The service answered after the merge finished.
    Completed,
    /// The request timed out while the merge keeps running server side.
    TimedOut,
}

/// Narrow request/response contract with the remote document-index service.
pub trait IndexService {
    fn index_exists(&self, index: &str) -> Result<bool>;

    fn create_index(&self, index: &str, settings: &Settings, mappings: &Mapping) -> Result<()>;

    fn delete_index(&self, index: &str) -> Result<()>;

    fn put_alias(&self, alias: &str, index: &str) -> Result<()>;

    fn alias_exists(&self, alias: &str) -> Result<bool>;

    /// Request a merge of the shards of `indices` down to `max_segments`.
    fn force_merge(&self, indices: &[String], max_segments: u32) -> Result<MergeStatus>;

    /// Number of force-merge threads currently active across all nodes.
    fn force_merge_active(&self) -> Result<u64>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    /// In-memory service recording every call.
    #[derive(Default)]
    pub struct FakeService {
        pub indices: RefCell<HashMap<String, serde_json::Value>>,
        pub aliases: RefCell<HashMap<String, String>>,
        pub calls: RefCell<Vec<String>>,
        pub merge_status: Option<MergeStatus>,
        pub active_counts: RefCell<VecDeque<u64>>,
    }

    impl FakeService {
        pub fn with_index(self, name: &str) -> Self {
            self.indices
                .borrow_mut()
                .insert(name.to_string(), serde_json::Value::Null);
            self
        }

        pub fn with_alias(self, alias: &str, index: &str) -> Self {
            self.aliases
                .borrow_mut()
                .insert(alias.to_string(), index.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl IndexService for FakeService {
        fn index_exists(&self, index: &str) -> Result<bool> {
            Ok(self.indices.borrow().contains_key(index))
        }

        fn create_index(&self, index: &str, settings: &Settings, mappings: &Mapping) -> Result<()> {
            self.record(format!("create {}", index));
            let body = serde_json::json!({
                "settings": settings.clone().into_value(),
                "mappings": mappings.to_value()?,
            });
            self.indices.borrow_mut().insert(index.to_string(), body);
            Ok(())
        }

        fn delete_index(&self, index: &str) -> Result<()> {
            self.record(format!("delete {}", index));
            self.indices.borrow_mut().remove(index);
            Ok(())
        }

        fn put_alias(&self, alias: &str, index: &str) -> Result<()> {
            self.record(format!("alias {} -> {}", alias, index));
            self.aliases
                .borrow_mut()
                .insert(alias.to_string(), index.to_string());
            Ok(())
        }

        fn alias_exists(&self, alias: &str) -> Result<bool> {
            Ok(self.aliases.borrow().contains_key(alias))
        }

        fn force_merge(&self, indices: &[String], max_segments: u32) -> Result<MergeStatus> {
            self.record(format!("merge {} {}", indices.join(","), max_segments));
            Ok(self.merge_status.unwrap_or(MergeStatus::Completed))
        }

        fn force_merge_active(&self) -> Result<u64> {
            self.record("stats".to_string());
            Ok(self.active_counts.borrow_mut().pop_front().unwrap_or(0))
        }
    }
}
