use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tsdb_core::config::{OPT_APT_REPOSITORY, OPT_FROM_RESOURCES};
use tsdb_core::state::STATE_FILE;
use tsdb_core::{
    AppliedState, DesiredConfiguration, Disposition, Event, EventKind, FileStateStore, Fingerprints,
    SourceMode, StateStore, UnitStatus,
};
use tsdb_test_utils::{FakeHost, options};

#[test]
fn commit_then_load_preserves_state() {
    let temp = TempDir::new().unwrap();
    let store = FileStateStore::new(temp.path());

    let desired = DesiredConfiguration {
        repository_url: Some("https://packagecloud.io/timescale/timescaledb/ubuntu/".into()),
        signing_key_url: Some("https://packagecloud.io/timescale/timescaledb/gpgkey".into()),
        version_pin: Some("2.11.2~ubuntu20.04".into()),
        ..Default::default()
    };
    let state = AppliedState::from_repository(&desired);
    store.commit(&state).unwrap();

    assert_eq!(store.load().unwrap(), state);
}

#[test]
fn commit_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let store = FileStateStore::new(temp.path());

    let mut fingerprints = Fingerprints::new();
    fingerprints.insert("core".into(), "sha256:ab".into());
    store
        .commit(&AppliedState::from_artifacts(&DesiredConfiguration::default(), fingerprints))
        .unwrap();

    let entries: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(entries.is_empty(), "leftover temp files: {:?}", entries);
    assert!(store.path().exists());
}

#[test]
fn empty_document_left_by_interrupted_write_does_not_block() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(STATE_FILE), "").unwrap();
    let store = FileStateStore::new(temp.path());
    let host = FakeHost::new();

    let outcome = host.unit(&store).dispatch(&Event::new(
        EventKind::Install,
        options(&[(OPT_APT_REPOSITORY, "https://a.example/")]),
    ));

    assert_eq!(outcome.status, Some(UnitStatus::Active));
    assert!(store.load().unwrap().installed);
}

#[test]
fn unparseable_document_blocks_event() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(STATE_FILE), "installed = [not toml").unwrap();
    let store = FileStateStore::new(temp.path());
    let host = FakeHost::new();

    let outcome = host.unit(&store).dispatch(&Event::new(
        EventKind::Install,
        options(&[(OPT_APT_REPOSITORY, "https://a.example/")]),
    ));

    match outcome.status {
        Some(UnitStatus::Blocked(message)) => assert!(message.starts_with("state store failed: ")),
        other => panic!("expected Blocked, got {:?}", other),
    }
    assert_eq!(outcome.disposition, Disposition::Defer);
    assert!(host.calls().is_empty());
}

#[test]
fn artifact_install_survives_restart() {
    let temp = TempDir::new().unwrap();
    let host = FakeHost::new().with_all_artifacts();
    let opts = options(&[(OPT_FROM_RESOURCES, "true")]);

    {
        let store = FileStateStore::new(temp.path());
        host.unit(&store)
            .dispatch(&Event::new(EventKind::Install, opts.clone()));
    }
    host.take_calls();

    // A fresh store over the same directory sees the fingerprints
    let store = FileStateStore::new(temp.path());
    assert_eq!(store.load().unwrap().source_mode, SourceMode::FromArtifacts);

    let outcome = host
        .unit(&store)
        .dispatch(&Event::new(EventKind::UpgradeCharm, opts));
    assert_eq!(outcome.status, Some(UnitStatus::Active));
    assert!(host.calls().is_empty());
}
