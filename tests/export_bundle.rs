use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use buildstamp::errors::BuildstampError;
use buildstamp::export::{
    ConfigBundle, ExportInputs, RUNTIME_KEYS, Value, ValueSpec, assemble, load_outputs,
    render_bundle,
};
use buildstamp::fingerprint::Fingerprint;
use buildstamp::fs::mock::MockFileSystem;
use buildstamp::fs::{FileSystem, RealFileSystem};
use buildstamp::pipeline::export_bundle;
use buildstamp::tag::{ArtifactTag, ArtifactTagger, SteppingClock};
use buildstamp::types::{OutputFormat, TagPolicy};
use buildstamp_test_utils::builders::{
    ArtifactConfigBuilder, ConfigFileBuilder, SourceConfigBuilder,
};
use buildstamp_test_utils::{init_tracing, write_tree};

type TestResult = Result<(), Box<dyn Error>>;

fn runtime_values() -> BTreeMap<String, ValueSpec> {
    let mut v = BTreeMap::new();
    v.insert("PG_VECTOR_DB_HOST".into(), ValueSpec::output("database.endpoint"));
    v.insert("PG_VECTOR_PORT".into(), ValueSpec::output("database.port"));
    v.insert("PG_VECTOR_DB_NAME".into(), ValueSpec::literal("vectordb"));
    v.insert("PG_VECTOR_SECRET_ARN".into(), ValueSpec::output("database.secret_arn"));
    v.insert("CHUNK_SIZE".into(), ValueSpec::literal(1000_i64));
    v.insert("CHUNK_OVERLAP".into(), ValueSpec::literal(100_i64));
    v.insert("VECTOR_DB_INDEX".into(), ValueSpec::literal("docs-index"));
    v.insert(
        "EMBEDDING_MODEL_ID".into(),
        ValueSpec::literal("amazon.titan-embed-text-v1"),
    );
    v.insert("S3_BUCKET_NAME".into(), ValueSpec::output("storage.bucket"));
    v.insert("INGESTION_SOURCE_HASH".into(), ValueSpec::fingerprint("ingest"));
    v.insert("RAG_IMAGE_TAG".into(), ValueSpec::tag("rag-image"));
    v
}

fn outputs() -> BTreeMap<String, Value> {
    let mut o = BTreeMap::new();
    o.insert("database.endpoint".into(), Value::from("db.cluster.internal"));
    o.insert("database.port".into(), Value::from(5432_i64));
    o.insert(
        "database.secret_arn".into(),
        Value::from("arn:aws:secretsmanager:eu-west-1:123456789012:secret:pg"),
    );
    o.insert("storage.bucket".into(), Value::from("docs-bucket-1a2b"));
    o
}

fn fingerprints() -> BTreeMap<String, Fingerprint> {
    let fp = Fingerprint::parse(blake3::hash(b"ingest").to_hex().as_str()).unwrap();
    BTreeMap::from([("ingest".to_string(), fp)])
}

fn tags() -> BTreeMap<String, ArtifactTag> {
    BTreeMap::from([(
        "rag-image".to_string(),
        ArtifactTag {
            artifact: "rag-image".to_string(),
            tag: "rag-20240611093005".to_string(),
            alias: None,
        },
    )])
}

#[test]
fn bundle_keys_match_declared_keys_exactly() {
    init_tracing();

    let values = runtime_values();
    let (outputs, fingerprints, tags) = (outputs(), fingerprints(), tags());
    let inputs = ExportInputs {
        outputs: &outputs,
        fingerprints: &fingerprints,
        tags: &tags,
    };

    let bundle = assemble(&values, &inputs).unwrap();

    let declared: Vec<&str> = values.keys().map(String::as_str).collect();
    let exported: Vec<&str> = bundle.keys().collect();
    assert_eq!(declared, exported);
    for key in RUNTIME_KEYS {
        assert!(bundle.get(key).is_some(), "missing runtime key {key}");
    }

    assert_eq!(bundle.get("CHUNK_SIZE"), Some(&Value::Integer(1000)));
    assert_eq!(bundle.get("PG_VECTOR_PORT"), Some(&Value::Integer(5432)));
    assert_eq!(
        bundle.get("PG_VECTOR_DB_HOST"),
        Some(&Value::from("db.cluster.internal"))
    );
    assert_eq!(
        bundle.get("RAG_IMAGE_TAG"),
        Some(&Value::from("rag-20240611093005"))
    );
    assert_eq!(
        bundle.get("INGESTION_SOURCE_HASH").map(|v| v.to_string()),
        Some(fingerprints["ingest"].to_string())
    );
}

#[test]
fn missing_output_is_unresolved_reference() {
    init_tracing();

    let values = runtime_values();
    let mut outputs = outputs();
    outputs.remove("storage.bucket");
    let (fingerprints, tags) = (fingerprints(), tags());
    let inputs = ExportInputs {
        outputs: &outputs,
        fingerprints: &fingerprints,
        tags: &tags,
    };

    match assemble(&values, &inputs) {
        Err(BuildstampError::UnresolvedReference { key, reference }) => {
            assert_eq!(key, "S3_BUCKET_NAME");
            assert_eq!(reference, "output:storage.bucket");
        }
        other => panic!("expected UnresolvedReference, got {:?}", other),
    }
}

#[test]
fn missing_fingerprint_or_tag_is_unresolved_reference() {
    let values = runtime_values();
    let outputs = outputs();
    let no_fps = BTreeMap::new();
    let tags = tags();

    let result = assemble(
        &values,
        &ExportInputs {
            outputs: &outputs,
            fingerprints: &no_fps,
            tags: &tags,
        },
    );
    assert!(matches!(
        result,
        Err(BuildstampError::UnresolvedReference { ref key, .. }) if key == "INGESTION_SOURCE_HASH"
    ));

    let fps = fingerprints();
    let no_tags = BTreeMap::new();
    let result = assemble(
        &values,
        &ExportInputs {
            outputs: &outputs,
            fingerprints: &fps,
            tags: &no_tags,
        },
    );
    assert!(matches!(
        result,
        Err(BuildstampError::UnresolvedReference { ref key, .. }) if key == "RAG_IMAGE_TAG"
    ));
}

fn small_bundle() -> ConfigBundle {
    let mut values = BTreeMap::new();
    values.insert("CHUNK_SIZE".to_string(), ValueSpec::literal(1000_i64));
    values.insert("VECTOR_DB_INDEX".to_string(), ValueSpec::literal("docs index"));
    values.insert("S3_BUCKET_NAME".to_string(), ValueSpec::literal("bucket-1"));
    let empty_o: BTreeMap<String, Value> = BTreeMap::new();
    let (f, t) = (BTreeMap::new(), BTreeMap::new());
    assemble(
        &values,
        &ExportInputs {
            outputs: &empty_o,
            fingerprints: &f,
            tags: &t,
        },
    )
    .unwrap()
}

#[test]
fn renders_env_json_and_toml() {
    let bundle = small_bundle();

    let env = render_bundle(&bundle, OutputFormat::Env).unwrap();
    assert_eq!(
        env,
        "CHUNK_SIZE=1000\nS3_BUCKET_NAME=bucket-1\nVECTOR_DB_INDEX=\"docs index\"\n"
    );

    let json = render_bundle(&bundle, OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["CHUNK_SIZE"], 1000);
    assert_eq!(parsed["VECTOR_DB_INDEX"], "docs index");

    let toml_out = render_bundle(&bundle, OutputFormat::Toml).unwrap();
    let parsed: toml::Table = toml::from_str(&toml_out).unwrap();
    assert_eq!(parsed["CHUNK_SIZE"].as_integer(), Some(1000));
    assert_eq!(parsed["S3_BUCKET_NAME"].as_str(), Some("bucket-1"));
}

#[test]
fn outputs_files_are_flattened_to_dotted_keys() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/deploy/outputs.json",
        br#"{"database": {"endpoint": "db.internal", "port": 5432}, "storage": {"bucket": "b"}, "pending": null}"#.to_vec(),
    );
    fs.add_file(
        "/deploy/outputs.toml",
        b"[database]\nendpoint = \"db.internal\"\nport = 5432\n\n[storage]\nbucket = \"b\"\n".to_vec(),
    );

    let from_json = load_outputs(&fs, Path::new("/deploy/outputs.json")).unwrap();
    let from_toml = load_outputs(&fs, Path::new("/deploy/outputs.toml")).unwrap();

    assert_eq!(from_json, from_toml);
    assert_eq!(from_json.get("database.port"), Some(&Value::Integer(5432)));
    assert!(!from_json.contains_key("pending"));
}

#[test]
fn list_outputs_are_rejected() {
    let fs = MockFileSystem::new();
    fs.add_file("/deploy/outputs.toml", b"subnets = [\"a\", \"b\"]\n".to_vec());

    let result = load_outputs(&fs, Path::new("/deploy/outputs.toml"));
    assert!(matches!(result, Err(BuildstampError::ConfigError(_))));
}

#[tokio::test]
async fn pipeline_export_fingerprints_only_what_is_referenced() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    write_tree(
        dir.path(),
        &[("ingest/handler.py", "def handler(): ...\n"), ("rag/server.py", "app = 1\n")],
    )?;

    let mut cfg = ConfigFileBuilder::new()
        .with_base_dir(dir.path())
        .with_source("ingest", SourceConfigBuilder::new("ingest").build())
        .with_source("rag", SourceConfigBuilder::new("rag").build())
        // Would fail with SourceUnavailable if it were fingerprinted.
        .with_source("unused", SourceConfigBuilder::new("missing-dir").build())
        .with_artifact(
            "rag-image",
            ArtifactConfigBuilder::new("rag").prefix("rag-").policy(TagPolicy::Timestamp).build(),
        )
        .with_required(RUNTIME_KEYS);
    for (k, v) in runtime_values() {
        cfg = cfg.with_value(&k, v);
    }
    let cfg = cfg.build();

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let at = Utc.with_ymd_and_hms(2024, 6, 11, 9, 30, 5).unwrap();
    let tagger = ArtifactTagger::new(SteppingClock::frozen(at));

    let bundle = export_bundle(&cfg, fs, &tagger, &outputs()).await?;

    assert_eq!(bundle.len(), runtime_values().len());
    assert_eq!(bundle.get("RAG_IMAGE_TAG"), Some(&Value::from("rag-20240611093005")));

    let ingest = cfg.source_tree("ingest")?;
    let expected = buildstamp::fingerprint::fingerprint_tree(&RealFileSystem, &ingest)?;
    assert_eq!(
        bundle.get("INGESTION_SOURCE_HASH"),
        Some(&Value::Text(expected.fingerprint.to_string()))
    );

    Ok(())
}
