//! File-based validation pipeline tests.

use bookreplay_rs::stream::StreamError;
use bookreplay_rs::validator::{CaseStatus, CrossValidator, ValidationHarness};
use std::path::Path;

const DELTAS_CSV: &str = "\
timestamp,sequence_num,delta_type,order_id,client_id,instrument_id,side,price,quantity,remaining_qty,trade_id,new_order_id,new_price,new_quantity
100,1,ADD,1,100,1,BUY,1000,50,50,0,0,0,0
200,2,ADD,2,101,1,SELL,1000,50,50,0,0,0,0
200,3,FILL,1,100,1,BUY,1000,50,0,1,0,0,0
200,4,FILL,2,101,1,SELL,1000,50,0,1,0,0,0
";

const TRADES_CSV: &str = "\
timestamp,trade_id,instrument_id,buyer_id,seller_id,buyer_order_id,seller_order_id,price,quantity,aggressor_side,fair_price
200,1,1,100,101,1,2,1000,50,SELL,950
";

const STATE_0: &str = r#"{"timestamp": 0, "sequence_num": 0,
    "order_books": {"1": {"bids": [], "asks": []}}, "pnl": {}}"#;

const STATE_1: &str = r#"{"timestamp": 100, "sequence_num": 1,
    "order_books": {"1": {
        "bids": [{"price": 1000, "orders": [
            {"order_id": 1, "client_id": 100, "quantity": 50,
             "price": 1000, "timestamp": 100, "side": "BUY"}]}],
        "asks": []}},
    "pnl": {}}"#;

const STATE_2: &str = r#"{"timestamp": 200, "sequence_num": 2,
    "order_books": {"1": {"bids": [], "asks": []}},
    "pnl": {
        "100": {"long_position": 50, "short_position": 0, "cash": -50000},
        "101": {"long_position": 0, "short_position": 50, "cash": 50000}}}"#;

fn write_case(dir: &Path) {
    std::fs::create_dir_all(dir.join("states")).unwrap();
    std::fs::write(dir.join("deltas.csv"), DELTAS_CSV).unwrap();
    std::fs::write(dir.join("trades.csv"), TRADES_CSV).unwrap();
    std::fs::write(dir.join("states/state_000000.json"), STATE_0).unwrap();
    std::fs::write(dir.join("states/state_000001.json"), STATE_1).unwrap();
    std::fs::write(dir.join("states/state_000002.json"), STATE_2).unwrap();
}

#[test]
fn full_pipeline_matches_every_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path());

    let validator = CrossValidator::new(dir.path());
    let results = validator.validate_all().unwrap();
    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(result.matched, "unexpected failure: {result}");
    }
}

#[test]
fn final_state_shortcut_returns_last_comparison() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path());

    let result = CrossValidator::new(dir.path())
        .validate_final_state()
        .unwrap();
    assert!(result.matched);
    assert_eq!(result.sequence_num, 2);
    assert_eq!(result.timestamp, Some(200));
}

#[test]
fn wrong_snapshot_fails_that_comparison_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path());
    // Claim the book still holds the bid at ts 200.
    std::fs::write(
        dir.path().join("states/state_000002.json"),
        STATE_1.replace("\"timestamp\": 100", "\"timestamp\": 200"),
    )
    .unwrap();

    let results = CrossValidator::new(dir.path()).validate_all().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[0].matched);
    assert!(results[1].matched);
    assert!(!results[2].matched);
    assert!(
        results[2]
            .differences
            .iter()
            .any(|d| d.contains("level count"))
    );
}

#[test]
fn unreadable_snapshot_becomes_a_failure_result() {
    let dir = tempfile::tempdir().unwrap();
    write_case(dir.path());
    std::fs::write(dir.path().join("states/state_000001.json"), "{not json").unwrap();

    let results = CrossValidator::new(dir.path()).validate_all().unwrap();
    assert_eq!(results.len(), 3);
    assert!(!results[1].matched);
    assert!(results[1].differences[0].contains("state file"));
    // The run continued past the bad snapshot.
    assert!(results[2].matched);
}

#[test]
fn missing_deltas_is_a_setup_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("states")).unwrap();
    std::fs::write(dir.path().join("states/state_000000.json"), STATE_0).unwrap();

    match CrossValidator::new(dir.path()).validate_all() {
        Err(StreamError::MissingInput { path }) => {
            assert!(path.ends_with("deltas.csv"));
        }
        other => panic!("expected MissingInput, got {other:?}"),
    }
}

#[test]
fn empty_states_directory_yields_single_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("states")).unwrap();
    std::fs::write(dir.path().join("deltas.csv"), DELTAS_CSV).unwrap();

    let results = CrossValidator::new(dir.path()).validate_all().unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].matched);
    assert!(results[0].differences[0].contains("No state files"));
}

#[test]
fn harness_discovers_and_validates_cases_in_parallel() {
    let root = tempfile::tempdir().unwrap();
    write_case(&root.path().join("test_0"));
    write_case(&root.path().join("test_1"));
    // A broken case: claims a bid that the replay will not produce.
    let broken = root.path().join("test_2");
    write_case(&broken);
    std::fs::write(
        broken.join("states/state_000000.json"),
        STATE_1.replace("\"timestamp\": 100", "\"timestamp\": 0"),
    )
    .unwrap();
    // Ignored: no states directory underneath.
    std::fs::create_dir_all(root.path().join("test_9")).unwrap();
    std::fs::create_dir_all(root.path().join("unrelated")).unwrap();

    let harness = ValidationHarness::new(root.path());
    let cases = harness.discover_cases().unwrap();
    assert_eq!(cases.len(), 3);

    let report = harness.run().unwrap();
    assert_eq!(report.total(), 3);
    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.success());
    assert_eq!(report.cases[2].name, "test_2");
    assert_eq!(report.cases[2].status, CaseStatus::Failed);

    let rendered = report.render();
    assert!(rendered.contains("[PASS] test_0 (3 states validated)"));
    assert!(rendered.contains("[FAIL] test_2"));
    assert!(rendered.contains("CROSS-VALIDATION FAILED"));
}

#[test]
fn harness_reports_skip_when_nothing_is_discovered() {
    let root = tempfile::tempdir().unwrap();
    let report = ValidationHarness::new(root.path()).run().unwrap();
    assert_eq!(report.total(), 1);
    assert_eq!(report.cases[0].status, CaseStatus::Skipped);
    assert!(report.success());
}

#[test]
fn sequential_mode_produces_the_same_report() {
    let root = tempfile::tempdir().unwrap();
    write_case(&root.path().join("test_0"));
    write_case(&root.path().join("test_1"));

    let parallel = ValidationHarness::new(root.path()).run().unwrap();
    let sequential = ValidationHarness::new(root.path()).sequential().run().unwrap();
    assert_eq!(parallel.total(), sequential.total());
    assert_eq!(parallel.passed(), sequential.passed());
}
