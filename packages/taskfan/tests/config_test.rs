//! Tests for loading configuration from disk and wiring it into coordinators

use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use taskfan::{
    BatchCoordinator, FailurePolicy, SequenceAggregator, StdRandom, TaskfanConfig, TokioClock,
};
use taskfan_common::ErrorKind;

fn temp_config(name: &str, json: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("taskfan-{}-{name}.json", std::process::id()));
    fs::write(&path, json).expect("temp file should be writable");
    path
}

#[test]
fn test_load_reads_and_validates_file() {
    let path = temp_config(
        "valid",
        r#"{ "coordinator": { "failure_policy": "cancel_siblings" },
             "sequence": { "length": 3, "interval_ms": 5 } }"#,
    );

    let config = TaskfanConfig::load(&path).expect("config should load");
    let _ = fs::remove_file(&path);

    assert_eq!(config.coordinator.failure_policy, FailurePolicy::CancelSiblings);
    assert_eq!(config.sequence.length, 3);
    assert_eq!(config.sequence.drain_duration(), Duration::from_millis(15));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("taskfan-does-not-exist.json");
    let err = TaskfanConfig::load(&path).expect_err("missing file should fail");

    assert_eq!(err.kind(), &ErrorKind::Io);
    assert!(err.to_string().contains("taskfan-does-not-exist"));
}

#[test]
fn test_load_rejects_zero_timeout() {
    let path = temp_config("zero-timeout", r#"{ "coordinator": { "batch_timeout_ms": 0 } }"#);

    let err = TaskfanConfig::load(&path).expect_err("zero timeout should fail");
    let _ = fs::remove_file(&path);

    assert_eq!(err.kind(), &ErrorKind::Configuration);
}

#[tokio::test(start_paused = true)]
async fn test_loaded_config_drives_coordinator_and_aggregator() {
    let config = TaskfanConfig::from_json(
        r#"{ "coordinator": { "default_max_delay": 0.5, "batch_timeout_ms": 2000 },
             "sequence": { "length": 2, "interval_ms": 50, "upper_bound": 1.0 } }"#,
    )
    .expect("config should parse");

    let mut coordinator = BatchCoordinator::builder()
        .with_config(config.coordinator.clone())
        .with_random(StdRandom::seeded(3))
        .build();
    let max_delay = coordinator.config().default_max_delay;
    let delays = coordinator
        .collect_sorted(4, max_delay)
        .await
        .expect("batch should succeed");
    assert!(delays.iter().all(|d| d.as_secs_f64() < 0.5));

    let mut aggregator =
        SequenceAggregator::with_parts(config.sequence.clone(), StdRandom::seeded(4), TokioClock)
            .expect("validated config should be accepted");
    let report = aggregator.run(2).await.expect("run should succeed");
    assert_eq!(report.value_count(), 4);
    assert!(report.merged().iter().all(|v| (0.0..1.0).contains(v)));
    assert_eq!(report.elapsed, config.sequence.drain_duration());
}
