//! End-to-end sync against a models directory.

use esmodels::config::{AutocompleteConfig, Config, PipelineConfig, StepKind};
use esmodels::dictionary::YamlDictionary;
use esmodels::extraction::{DescriptionsPolicy, DirectorySource, LoadOptions, ModelCache};
use esmodels::sync::{DescriptionTarget, PipelineBuilder, SyncRequest, run_sync};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CASE_MAPPING: &str = r#"properties:
  case_id:
    type: keyword
  submitter_id:
    type: keyword
  age:
    type: long
  project:
    properties:
      disease_type:
        type: keyword
"#;

const CASE_VESTIGIAL: &str = r#"dictionary_item_added:
  "root['properties']['old_field']":
    type: keyword
"#;

fn setup() -> TempDir {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("graph").join("case");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("mapping.yaml"), CASE_MAPPING).unwrap();
    fs::write(dir.join("vestigial.yaml"), CASE_VESTIGIAL).unwrap();
    fs::write(
        temp.path().join("graph").join("settings.yaml"),
        "index.number_of_shards: 3\n",
    )
    .unwrap();
    temp
}

fn cache(root: &Path) -> ModelCache<DirectorySource> {
    ModelCache::new(DirectorySource::new(root), LoadOptions::default())
}

fn read_yaml(path: &Path) -> Value {
    serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn sync(root: &Path, config: &Config, dry_run: bool) -> Vec<esmodels::sync::SyncOutcome> {
    let builder = PipelineBuilder::new(config);
    let request = SyncRequest {
        dry_run,
        ..Default::default()
    };
    run_sync(&mut cache(root), &builder, &request).unwrap()
}

#[test]
fn test_sync_writes_canonical_mapping_and_settings() {
    let temp = setup();
    let outcomes = sync(temp.path(), &Config::default(), false);
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].mapping_changed());

    let dir = temp.path().join("graph").join("case");
    let mapping = read_yaml(&dir.join("mapping.yaml"));
    assert_eq!(mapping["dynamic"], "strict");
    assert_eq!(mapping["_size"], json!({"enabled": true}));
    assert_eq!(
        mapping["properties"]["case_id"],
        json!({"type": "keyword", "normalizer": "clinical_normalizer"})
    );
    assert_eq!(
        mapping["properties"]["project"]["properties"]["disease_type"]["normalizer"],
        "clinical_normalizer"
    );
    // Excluded names keep their case.
    assert_eq!(mapping["properties"]["submitter_id"], json!({"type": "keyword"}));
    // Vestigial fields stay out of the canonical mapping.
    assert!(mapping["properties"].get("old_field").is_none());

    let settings = read_yaml(&temp.path().join("graph").join("settings.yaml"));
    assert_eq!(settings["index"]["number_of_shards"], 3);
    assert!(
        settings["index"]["analysis"]["normalizer"]
            .get("clinical_normalizer")
            .is_some()
    );
}

#[test]
fn test_sync_preserves_vestigial_fields() {
    let temp = setup();
    sync(temp.path(), &Config::default(), false);

    let vestigial = read_yaml(&temp.path().join("graph").join("case").join("vestigial.yaml"));
    assert_eq!(
        vestigial["dictionary_item_added"]["root['properties']['old_field']"],
        json!({"type": "keyword"})
    );

    let mut cache = cache(temp.path());
    let with = cache.models(true).unwrap();
    let mapping = with.model("graph", "case").unwrap().mapping();
    assert!(mapping.property_at("old_field").is_some());
    assert_eq!(
        mapping.property_at("case_id").unwrap().normalizer.as_deref(),
        Some("clinical_normalizer")
    );

    let without = cache.models(false).unwrap();
    assert!(
        without
            .model("graph", "case")
            .unwrap()
            .mapping()
            .property_at("old_field")
            .is_none()
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = setup();
    let dir = temp.path().join("graph").join("case");

    let outcomes = sync(temp.path(), &Config::default(), true);

    assert!(outcomes[0].dry_run);
    assert!(outcomes[0].files.contains(&dir.join("mapping.yaml")));
    assert_eq!(fs::read_to_string(dir.join("mapping.yaml")).unwrap(), CASE_MAPPING);
    assert_eq!(fs::read_to_string(dir.join("vestigial.yaml")).unwrap(), CASE_VESTIGIAL);
    assert_eq!(
        fs::read_to_string(temp.path().join("graph").join("settings.yaml")).unwrap(),
        "index.number_of_shards: 3\n"
    );
}

#[test]
fn test_second_sync_changes_nothing() {
    let temp = setup();
    let dir = temp.path().join("graph").join("case");
    let settings = temp.path().join("graph").join("settings.yaml");

    sync(temp.path(), &Config::default(), false);
    let first = (
        fs::read_to_string(dir.join("mapping.yaml")).unwrap(),
        fs::read_to_string(dir.join("vestigial.yaml")).unwrap(),
        fs::read_to_string(&settings).unwrap(),
    );

    let outcomes = sync(temp.path(), &Config::default(), false);
    let second = (
        fs::read_to_string(dir.join("mapping.yaml")).unwrap(),
        fs::read_to_string(dir.join("vestigial.yaml")).unwrap(),
        fs::read_to_string(&settings).unwrap(),
    );

    assert_eq!(first, second);
    // Only the vestigial field separates canonical from loaded.
    let delta = &outcomes[0].delta;
    assert_eq!(delta.added().len(), 1);
    assert!(delta.removed().is_empty());
    assert!(delta.changed().is_empty());
}

#[test]
fn test_already_canonical_mapping_is_not_rewritten() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("plain");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("mapping.yaml"),
        "properties:\n  count:\n    type: long\n",
    )
    .unwrap();

    let config = Config {
        pipelines: [(
            "plain".to_string(),
            PipelineConfig {
                steps: vec![StepKind::Normalizer],
                ..Default::default()
            },
        )]
        .into_iter()
        .collect(),
        ..Config::default()
    };

    let outcomes = sync(temp.path(), &config, false);
    assert!(!outcomes[0].mapping_changed());
    assert!(!dir.join("vestigial.yaml").exists());
    assert!(!outcomes[0].files.contains(&dir.join("mapping.yaml")));
    assert!(outcomes[0].files.contains(&dir.join("settings.yaml")));
}

#[test]
fn test_autocomplete_pipeline_from_config() {
    let temp = setup();
    let config = Config {
        pipelines: [(
            "graph/case".to_string(),
            PipelineConfig {
                steps: vec![StepKind::Autocomplete],
                autocomplete: Some(AutocompleteConfig {
                    field: "gene_autocomplete".to_string(),
                    sources: vec!["case_id".to_string()],
                }),
                ..Default::default()
            },
        )]
        .into_iter()
        .collect(),
        ..Config::default()
    };

    sync(temp.path(), &config, false);

    let mapping = read_yaml(&temp.path().join("graph").join("case").join("mapping.yaml"));
    assert_eq!(mapping["properties"]["case_id"]["copy_to"], json!(["gene_autocomplete"]));
    assert_eq!(
        mapping["properties"]["gene_autocomplete"]["fields"]["prefix"]["analyzer"],
        "autocomplete_prefix"
    );
}

#[test]
fn test_unknown_index_filter_is_skipped() {
    let temp = setup();
    let config = Config::default();
    let builder = PipelineBuilder::new(&config);
    let request = SyncRequest {
        indices: vec!["missing".to_string()],
        ..Default::default()
    };
    let outcomes = run_sync(&mut cache(temp.path()), &builder, &request).unwrap();
    assert!(outcomes.is_empty());
}

fn sync_descriptions_then_reload(policy: DescriptionsPolicy) -> Value {
    let temp = setup();
    let config = Config {
        pipelines: [(
            "graph/case".to_string(),
            PipelineConfig {
                steps: vec![StepKind::Descriptions],
                descriptions: vec![DescriptionTarget {
                    entity: "case".to_string(),
                    label: None,
                    prefixes: vec!["cases".to_string()],
                }],
                ..Default::default()
            },
        )]
        .into_iter()
        .collect(),
        ..Config::default()
    };
    let dictionary =
        YamlDictionary::from_yaml("case:\n  properties:\n    case_id: {description: The case.}\n")
            .unwrap();
    let builder = PipelineBuilder::new(&config).with_dictionary(Arc::new(dictionary));
    let options = LoadOptions {
        descriptions: policy,
        ..LoadOptions::default()
    };
    let mut cache = ModelCache::new(DirectorySource::new(temp.path()), options);

    run_sync(&mut cache, &builder, &SyncRequest::default()).unwrap();

    let models = cache.models(true).unwrap();
    let mapping = models.model("graph", "case").unwrap().mapping();
    assert_eq!(
        mapping.descriptions().map(|d| d["cases.case_id"].as_str()),
        Some("The case.")
    );
    read_yaml(&temp.path().join("graph").join("descriptions.yaml"))
}

#[test]
fn test_descriptions_survive_sync_when_wrapped() {
    let document = sync_descriptions_then_reload(DescriptionsPolicy::Wrap);
    assert_eq!(document, json!({"cases.case_id": "The case."}));
}

#[test]
fn test_descriptions_survive_sync_under_require_meta() {
    let document = sync_descriptions_then_reload(DescriptionsPolicy::RequireMeta);
    assert_eq!(
        document,
        json!({"_meta": {"descriptions": {"cases.case_id": "The case."}}})
    );
}
