use purger::core::{Ledger, LedgerError, Thresholds};
use std::fs;
use tempfile::TempDir;

const NOW: i64 = 1_700_000_000;

fn thresholds() -> Thresholds {
    Thresholds::new(2 * 24 * 60 * 60)
}

#[test]
fn test_unchanged_ledger_round_trips_exactly() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("user_activity.json");

    // document as written by an earlier deployment
    fs::write(
        &path,
        r#"{"last_update": 1699990000, "network_to_users": {"1": {"@0xaa:s.org": 1699000000, "@0xbb:s.org": 1699500000}, "5": {}}}"#,
    )
    .unwrap();

    let first = Ledger::load(&path).unwrap();
    first.persist(&path).unwrap();
    let written = fs::read_to_string(&path).unwrap();

    let second = Ledger::load(&path).unwrap();
    second.persist(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&path).unwrap(), written);
    assert!(written.contains("\"last_update\":1699990000"));
    assert!(written.contains("\"network_to_users\""));
}

#[test]
fn test_corrupt_ledger_falls_back_to_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("user_activity.json");
    fs::write(&path, b"\x00\x01 definitely not json").unwrap();

    assert!(matches!(
        Ledger::load(&path),
        Err(LedgerError::CorruptState(_))
    ));

    let ledger = Ledger::load_or_fresh(&path, NOW, &thresholds());
    assert!(ledger.networks.is_empty());
    assert!(thresholds().refresh_due(ledger.last_global_refresh, NOW));
}

#[test]
fn test_missing_ledger_falls_back_to_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.json");

    let ledger = Ledger::load_or_fresh(&path, NOW, &thresholds());
    assert_eq!(ledger, Ledger::fresh(NOW, &thresholds()));
}

#[test]
fn test_persist_leaves_no_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("user_activity.json");

    let mut ledger = Ledger::fresh(NOW, &thresholds());
    for i in 0..50 {
        ledger
            .ensure_network("1")
            .insert(format!("@user{}:s.org", i), NOW - i);
    }
    ledger.persist(&path).unwrap();
    ledger.persist(&path).unwrap();

    let names: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("user_activity.json")]);
    assert_eq!(Ledger::load(&path).unwrap().account_count(), 50);
}

#[test]
fn test_failed_persist_keeps_previous_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("user_activity.json");

    let mut original = Ledger::fresh(NOW, &thresholds());
    original
        .ensure_network("1")
        .insert("@kept:s.org".to_string(), NOW);
    original.persist(&path).unwrap();
    let baseline = fs::read_to_string(&path).unwrap();

    // target directory vanished: the write must fail without touching anything
    let bogus = temp_dir.path().join("missing-dir").join("user_activity.json");
    let mut changed = original.clone();
    changed.segment_mut("1").unwrap().clear();
    assert!(changed.persist(&bogus).is_err());

    assert_eq!(fs::read_to_string(&path).unwrap(), baseline);
}
