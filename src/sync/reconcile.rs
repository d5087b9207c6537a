//! Sync reconciliation: write the canonical mapping and its vestigial delta.

use super::{PipelineBuilder, Synchronizer};
use crate::error::{Error, Result};
use crate::extraction::{
    DESCRIPTIONS_FILE, DescriptionsPolicy, DirectorySource, MAPPING_FILE, ModelCache,
    SETTINGS_FILE, VESTIGIAL_FILE,
};
use crate::models::{Mapping, ModelRef};
use crate::tree::Delta;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of syncing one doc-type.
#[derive(Debug)]
pub struct SyncOutcome {
    pub index: String,
    pub doc_type: String,
    /// Difference from the new canonical mapping to the previous one.
    pub delta: Delta,
    /// Files written, or that would be written on a dry run.
    pub files: Vec<PathBuf>,
    pub dry_run: bool,
}

impl SyncOutcome {
    pub fn mapping_changed(&self) -> bool {
        !self.delta.is_empty()
    }
}

struct StagedWrite {
    path: PathBuf,
    contents: String,
}

/// `descriptions.yaml` as read under [`DescriptionsPolicy::RequireMeta`].
#[derive(Serialize)]
struct MetaDocument<'a> {
    #[serde(rename = "_meta")]
    meta: MetaDescriptions<'a>,
}

#[derive(Serialize)]
struct MetaDescriptions<'a> {
    descriptions: &'a IndexMap<String, String>,
}

type Verify = fn(&Value, &Delta, &Value, &str, &str) -> Result<()>;

/// Recomputes one doc-type and writes the results under a models directory.
pub struct Reconciler {
    root: PathBuf,
    dry_run: bool,
    descriptions: DescriptionsPolicy,
    verify: Verify,
}

impl Reconciler {
    pub fn new(root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            dry_run,
            descriptions: DescriptionsPolicy::default(),
            verify,
        }
    }

    /// Write `descriptions.yaml` in the shape the loader reads under `policy`.
    pub fn with_descriptions_policy(mut self, policy: DescriptionsPolicy) -> Self {
        self.descriptions = policy;
        self
    }

    #[cfg(test)]
    fn with_verify(mut self, verify: Verify) -> Self {
        self.verify = verify;
        self
    }

    /// Run `synchronizer` over `baseline` (the canonical mapping without
    /// vestigial fields) and reconcile the result with `previous` (what is
    /// loaded today, vestigial fields included).
    ///
    /// Settings are always written. The mapping and vestigial files are
    /// written only when the canonical mapping differs from `previous`, and
    /// descriptions only when the pipeline produced some. Nothing is written
    /// if the delta does not reproduce `previous`.
    pub fn reconcile(
        &self,
        previous: ModelRef<'_>,
        baseline: &Mapping,
        synchronizer: &dyn Synchronizer,
    ) -> Result<SyncOutcome> {
        let index = previous.index_name();
        let doc_type = previous.doc_type_name();

        let mut old_mapping = previous.mapping().clone();
        old_mapping.meta = None;
        let mut input = baseline.clone();
        input.meta = None;

        let (mut canonical, settings) = synchronizer.sync(input, previous.settings().clone())?;
        let descriptions = canonical.take_descriptions();

        let canonical_value = canonical.to_value()?;
        let previous_value = old_mapping.to_value()?;
        let delta = Delta::diff(&canonical_value, &previous_value);
        (self.verify)(&canonical_value, &delta, &previous_value, index, doc_type)?;

        let doc_dir = self.doc_type_dir(index, doc_type);
        let index_dir = self.root.join(index);

        let mut staged = vec![StagedWrite {
            path: index_dir.join(SETTINGS_FILE),
            contents: serde_yaml::to_string(&settings)?,
        }];
        if !delta.is_empty() {
            staged.push(StagedWrite {
                path: doc_dir.join(MAPPING_FILE),
                contents: serde_yaml::to_string(&canonical)?,
            });
            staged.push(StagedWrite {
                path: doc_dir.join(VESTIGIAL_FILE),
                contents: delta.to_yaml()?,
            });
        }
        if !descriptions.is_empty() {
            staged.push(StagedWrite {
                path: index_dir.join(DESCRIPTIONS_FILE),
                contents: self.descriptions_yaml(&descriptions)?,
            });
        }

        if self.dry_run {
            debug!(index, doc_type, files = staged.len(), "Dry run; nothing written");
        } else {
            for write in &staged {
                if let Some(parent) = write.path.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
                }
                fs::write(&write.path, &write.contents).map_err(|e| Error::io(&write.path, e))?;
            }
        }

        info!(
            index,
            doc_type,
            added = delta.added().len(),
            removed = delta.removed().len(),
            changed = delta.changed().len(),
            "Synced"
        );

        Ok(SyncOutcome {
            index: index.to_string(),
            doc_type: doc_type.to_string(),
            delta,
            files: staged.into_iter().map(|write| write.path).collect(),
            dry_run: self.dry_run,
        })
    }

    fn doc_type_dir(&self, index: &str, doc_type: &str) -> PathBuf {
        if index == doc_type {
            self.root.join(index)
        } else {
            self.root.join(index).join(doc_type)
        }
    }

    fn descriptions_yaml(&self, descriptions: &IndexMap<String, String>) -> Result<String> {
        let yaml = match self.descriptions {
            DescriptionsPolicy::Wrap => serde_yaml::to_string(descriptions)?,
            DescriptionsPolicy::RequireMeta => serde_yaml::to_string(&MetaDocument {
                meta: MetaDescriptions { descriptions },
            })?,
        };
        Ok(yaml)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn verify(
    canonical: &Value,
    delta: &Delta,
    previous: &Value,
    index: &str,
    doc_type: &str,
) -> Result<()> {
    let violation = || Error::ConsistencyViolation {
        index: index.to_string(),
        doc_type: doc_type.to_string(),
    };
    match delta.apply(canonical.clone()) {
        Ok(restored) if restored == *previous => Ok(()),
        Ok(_) => Err(violation()),
        Err(e) => {
            warn!(index, doc_type, error = %e, "Delta could not be applied");
            Err(violation())
        }
    }
}

/// Which doc-types to sync.
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    /// Empty means every loaded index.
    pub indices: Vec<String>,
    /// Empty means every doc-type of the selected indices.
    pub doc_types: Vec<String>,
    pub dry_run: bool,
}

/// Sync the requested doc-types of a models directory.
///
/// Unknown indices are logged and skipped. The cache is invalidated after
/// anything was written.
pub fn run_sync(
    cache: &mut ModelCache<DirectorySource>,
    builder: &PipelineBuilder<'_>,
    request: &SyncRequest,
) -> Result<Vec<SyncOutcome>> {
    let previous = cache.models(true)?;
    let baseline = cache.models(false)?;
    let reconciler = Reconciler::new(cache.source().root(), request.dry_run)
        .with_descriptions_policy(cache.options().descriptions);

    let indices: Vec<&str> = if request.indices.is_empty() {
        previous.index_names().collect()
    } else {
        request.indices.iter().map(String::as_str).collect()
    };

    let mut outcomes = Vec::new();
    for name in indices {
        let index = match previous.index(name) {
            Ok(index) => index,
            Err(e) if e.is_recoverable() => {
                warn!(index = name, "{}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        for model in index.models() {
            let doc_type = model.doc_type_name();
            if !request.doc_types.is_empty() && !request.doc_types.iter().any(|d| d == doc_type) {
                continue;
            }

            let baseline_mapping = baseline
                .model(name, doc_type)
                .map(|m| m.mapping())
                .unwrap_or_else(|_| model.mapping());
            let pipeline = builder.build(name, doc_type)?;
            info!(index = name, doc_type, steps = ?pipeline.step_names(), "Syncing");
            outcomes.push(reconciler.reconcile(model, baseline_mapping, &pipeline)?);
        }
    }

    if !request.dry_run && !outcomes.is_empty() {
        cache.invalidate();
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::LoadOptions;
    use crate::sync::NormalizerSynchronizer;
    use serde_json::json;
    use tempfile::TempDir;

    fn always_violates(
        _canonical: &Value,
        _delta: &Delta,
        _previous: &Value,
        index: &str,
        doc_type: &str,
    ) -> Result<()> {
        Err(Error::ConsistencyViolation {
            index: index.to_string(),
            doc_type: doc_type.to_string(),
        })
    }

    fn models_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("foo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MAPPING_FILE), "properties:\n  disease_type:\n    type: keyword\n").unwrap();
        temp
    }

    #[test]
    fn test_verify_accepts_exact_round_trip() {
        let canonical = json!({"properties": {"a": {"type": "keyword"}}});
        let previous = json!({"properties": {"a": {"type": "keyword"}, "b": {"type": "long"}}});
        let delta = Delta::diff(&canonical, &previous);
        assert!(verify(&canonical, &delta, &previous, "i", "d").is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_delta() {
        let canonical = json!({"properties": {"a": {"type": "keyword"}}});
        let previous = json!({"properties": {"b": {"type": "long"}}});
        // Only the additions survive a round trip through YAML.
        let delta = Delta::from_yaml(&Delta::diff(&canonical, &previous).to_yaml().unwrap()).unwrap();
        let err = verify(&canonical, &delta, &previous, "i", "d").unwrap_err();
        assert!(matches!(err, Error::ConsistencyViolation { .. }));
    }

    #[test]
    fn test_verify_rejects_unappliable_delta() {
        let canonical = json!({"properties": "oops"});
        let delta = Delta::from_yaml(r#"dictionary_item_added: {"root['properties']['x']": 1}"#).unwrap();
        let err = verify(&canonical, &delta, &json!({}), "i", "d").unwrap_err();
        assert!(matches!(err, Error::ConsistencyViolation { .. }));
    }

    #[test]
    fn test_doc_type_dir() {
        let reconciler = Reconciler::new("/models", true);
        assert_eq!(reconciler.doc_type_dir("a", "a"), PathBuf::from("/models/a"));
        assert_eq!(reconciler.doc_type_dir("a", "b"), PathBuf::from("/models/a/b"));
    }

    #[test]
    fn test_consistency_violation_writes_nothing() {
        let temp = models_dir();
        let dir = temp.path().join("foo");
        let before = fs::read_to_string(dir.join(MAPPING_FILE)).unwrap();

        let mut cache = ModelCache::new(DirectorySource::new(temp.path()), LoadOptions::default());
        let models = cache.models(true).unwrap();
        let model = models.model("foo", "foo").unwrap();
        let normalizer = NormalizerSynchronizer::default();

        let err = Reconciler::new(temp.path(), false)
            .with_verify(always_violates)
            .reconcile(model, model.mapping(), &normalizer)
            .unwrap_err();
        assert!(matches!(err, Error::ConsistencyViolation { .. }));
        assert_eq!(fs::read_to_string(dir.join(MAPPING_FILE)).unwrap(), before);
        assert!(!dir.join(SETTINGS_FILE).exists());
        assert!(!dir.join(VESTIGIAL_FILE).exists());

        // The same doc-type does get written once the round trip holds.
        let outcome = Reconciler::new(temp.path(), false)
            .reconcile(model, model.mapping(), &normalizer)
            .unwrap();
        assert!(outcome.mapping_changed());
        assert!(dir.join(SETTINGS_FILE).exists());
        assert_ne!(fs::read_to_string(dir.join(MAPPING_FILE)).unwrap(), before);
    }

    #[test]
    fn test_descriptions_document_follows_policy() {
        let descriptions: IndexMap<String, String> =
            [("case_id".to_string(), "The case".to_string())].into_iter().collect();

        let wrap = Reconciler::new("/models", true).descriptions_yaml(&descriptions).unwrap();
        let value: Value = serde_yaml::from_str(&wrap).unwrap();
        assert_eq!(value, json!({"case_id": "The case"}));

        let meta = Reconciler::new("/models", true)
            .with_descriptions_policy(DescriptionsPolicy::RequireMeta)
            .descriptions_yaml(&descriptions)
            .unwrap();
        let value: Value = serde_yaml::from_str(&meta).unwrap();
        assert_eq!(value, json!({"_meta": {"descriptions": {"case_id": "The case"}}}));
    }
}
