use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tsdb_fs::DocumentStore;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    installed: bool,
    fingerprints: BTreeMap<String, String>,
}

fn sample() -> Sample {
    let mut fingerprints = BTreeMap::new();
    fingerprints.insert("core".to_string(), "sha256:abc".to_string());
    Sample {
        installed: true,
        fingerprints,
    }
}

#[rstest]
#[case("state.toml")]
#[case("state.json")]
#[case("state.yaml")]
fn test_save_then_load_preserves_document(#[case] file_name: &str) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(file_name);
    let store = DocumentStore::new();

    store.save(&path, &sample()).unwrap();
    let loaded: Sample = store.load(&path).unwrap();

    assert_eq!(loaded, sample());
}

#[test]
fn test_load_flat_yaml_options() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("options.yaml");
    std::fs::write(
        &path,
        "apt-repository: https://packagecloud.io/timescale/timescaledb/ubuntu/\nversion: \"\"\n",
    )
    .unwrap();

    let options: BTreeMap<String, String> = DocumentStore::new().load(&path).unwrap();

    assert_eq!(
        options["apt-repository"],
        "https://packagecloud.io/timescale/timescaledb/ubuntu/"
    );
    assert_eq!(options["version"], "");
}

#[test]
fn test_save_unsupported_extension_fails() {
    let temp = TempDir::new().unwrap();
    let result = DocumentStore::new().save(&temp.path().join("state.ini"), &sample());
    assert!(matches!(
        result,
        Err(tsdb_fs::Error::UnsupportedFormat { .. })
    ));
}
