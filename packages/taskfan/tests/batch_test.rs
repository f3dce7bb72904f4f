//! Tests for batch collection contracts, failure policies and metrics

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskfan::{
    task_wait_n, wait_n, BatchCoordinator, Clock, Delay, FailurePolicy, RandomSource,
    ScriptedRandom, StdRandom, TaskError, TaskResult, TokioClock,
};

/// Counts how many per-task generators were handed out
struct CountingRandom {
    inner: StdRandom,
    forks: Arc<AtomicUsize>,
}

impl RandomSource for CountingRandom {
    fn uniform(&mut self, upper: f64) -> TaskResult<f64> {
        self.inner.uniform(upper)
    }

    fn fork(&mut self) -> Self {
        self.forks.fetch_add(1, Ordering::SeqCst);
        Self {
            inner: self.inner.fork(),
            forks: Arc::clone(&self.forks),
        }
    }
}

fn scripted(values: &[f64]) -> ScriptedRandom {
    ScriptedRandom::new(values.to_vec()).expect("script should not be empty")
}

fn secs(delays: &[Delay]) -> Vec<f64> {
    delays.iter().map(|d| d.as_secs_f64()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_collect_sorted_returns_n_ascending_delays() {
    let mut coordinator = BatchCoordinator::builder()
        .with_random(StdRandom::seeded(11))
        .build();

    let delays = coordinator
        .collect_sorted(25, 0.4)
        .await
        .expect("batch should succeed");

    assert_eq!(delays.len(), 25);
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert!(delays.iter().all(|d| (0.0..0.4).contains(&d.as_secs_f64())));
}

#[tokio::test(start_paused = true)]
async fn test_batch_runs_concurrently() {
    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.3, 0.1, 0.2]))
        .build();
    let start = coordinator.clock().now();

    coordinator
        .collect_sorted(3, 1.0)
        .await
        .expect("batch should succeed");

    // The batch takes as long as its slowest task, not the sum of all three
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(310), "serialized? {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_spawn_order_is_not_value_order() {
    let script = [0.3, 0.1, 0.2];

    let mut by_spawn = BatchCoordinator::builder()
        .with_random(scripted(&script))
        .build();
    let spawn_order = by_spawn
        .collect_by_spawn_order(3, 1.0)
        .await
        .expect("batch should succeed");

    let mut by_value = BatchCoordinator::builder()
        .with_random(scripted(&script))
        .build();
    let sorted = by_value
        .collect_sorted(3, 1.0)
        .await
        .expect("batch should succeed");

    assert_eq!(secs(&spawn_order), vec![0.3, 0.1, 0.2]);
    assert_eq!(secs(&sorted), vec![0.1, 0.2, 0.3]);
}

#[tokio::test(start_paused = true)]
async fn test_collect_by_completion_tags_spawn_index() {
    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.3, 0.1, 0.2]))
        .build();

    let records = coordinator
        .collect_by_completion(3, 1.0)
        .await
        .expect("batch should succeed");

    let indices: Vec<usize> = records.iter().map(|r| r.spawn_index).collect();
    assert_eq!(indices, vec![1, 2, 0]);
    assert_eq!(records[0].delay.as_secs_f64(), 0.1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_arguments_spawn_nothing() {
    let forks = Arc::new(AtomicUsize::new(0));
    let mut coordinator = BatchCoordinator::builder()
        .with_random(CountingRandom {
            inner: StdRandom::seeded(5),
            forks: Arc::clone(&forks),
        })
        .build();

    assert!(matches!(
        coordinator.collect_sorted(0, 5.0).await,
        Err(TaskError::InvalidArgument(_))
    ));
    assert!(matches!(
        coordinator.collect_sorted(3, -1.0).await,
        Err(TaskError::InvalidArgument(_))
    ));
    assert!(matches!(
        coordinator.collect_by_spawn_order(0, 1.0).await,
        Err(TaskError::InvalidArgument(_))
    ));
    assert!(matches!(
        coordinator.collect_by_completion(2, f64::NAN).await,
        Err(TaskError::InvalidArgument(_))
    ));

    assert_eq!(forks.load(Ordering::SeqCst), 0);
    let metrics = coordinator.metrics();
    assert_eq!(metrics.tasks_spawned, 0);
    assert_eq!(metrics.batches_run, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_to_completion_waits_for_every_sibling() {
    // The second task's draw is out of range and fails immediately
    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.2, 5.0, 0.3]))
        .with_failure_policy(FailurePolicy::RunToCompletion)
        .build();
    let start = coordinator.clock().now();

    let outcome = coordinator.collect_by_spawn_order(3, 1.0).await;

    assert!(matches!(outcome, Err(TaskError::ExecutionFailed(_))));
    assert!(start.elapsed() >= Duration::from_millis(300));
    let metrics = coordinator.metrics();
    assert_eq!(metrics.tasks_completed, 2);
    assert_eq!(metrics.tasks_failed, 1);
    assert_eq!(metrics.tasks_cancelled, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_siblings_aborts_unjoined_handles() {
    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.2, 5.0, 0.3]))
        .with_failure_policy(FailurePolicy::CancelSiblings)
        .build();
    let start = coordinator.clock().now();

    let outcome = coordinator.collect_by_spawn_order(3, 1.0).await;

    assert!(matches!(outcome, Err(TaskError::ExecutionFailed(_))));
    // The failure is observed when handle 1 is joined, right after handle 0
    let elapsed = start.elapsed();
    assert!(elapsed < Duration::from_millis(300), "sibling was awaited: {elapsed:?}");
    let metrics = coordinator.metrics();
    assert_eq!(metrics.tasks_completed, 1);
    assert_eq!(metrics.tasks_failed, 1);
    assert_eq!(metrics.tasks_cancelled, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_siblings_in_sorted_batch_fails_fast() {
    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.2, 5.0, 0.3]))
        .with_failure_policy(FailurePolicy::CancelSiblings)
        .build();
    let start = coordinator.clock().now();

    let outcome = coordinator.collect_sorted(3, 1.0).await;

    assert!(matches!(outcome, Err(TaskError::ExecutionFailed(_))));
    assert!(start.elapsed() < Duration::from_millis(200));
    let metrics = coordinator.metrics();
    assert_eq!(metrics.tasks_failed, 1);
    assert_eq!(metrics.tasks_cancelled, 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_to_completion_reports_earliest_spawned_failure() {
    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.1, 7.0, 0.2, 3.0]))
        .build();

    let outcome = coordinator.collect_by_completion(4, 1.0).await;

    match outcome {
        Err(TaskError::ExecutionFailed(message)) => {
            assert!(message.contains("7"), "wrong failure kept: {message}");
        }
        other => panic!("expected a failed draw, got {other:?}"),
    }
    assert_eq!(coordinator.metrics().tasks_failed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_batch_timeout_aborts_remaining_tasks() {
    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.05, 0.5]))
        .with_batch_timeout(Duration::from_millis(100))
        .build();
    let start = coordinator.clock().now();

    let outcome = coordinator.collect_by_spawn_order(2, 1.0).await;

    assert_eq!(outcome, Err(TaskError::Timeout(Duration::from_millis(100))));
    assert!(start.elapsed() < Duration::from_millis(150));
    let metrics = coordinator.metrics();
    assert_eq!(metrics.tasks_completed, 1);
    assert_eq!(metrics.tasks_cancelled, 1);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_accumulate_across_batches() {
    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.1, 0.2, 0.3]))
        .build();

    coordinator
        .collect_sorted(3, 1.0)
        .await
        .expect("batch should succeed");
    coordinator
        .collect_by_spawn_order(3, 1.0)
        .await
        .expect("batch should succeed");

    let metrics = coordinator.metrics();
    assert_eq!(metrics.batches_run, 2);
    assert_eq!(metrics.tasks_spawned, 6);
    assert_eq!(metrics.tasks_completed, 6);
    assert!(metrics.last_batch_elapsed >= Duration::from_millis(300));
    let average = metrics.average_delay.as_secs_f64();
    assert!((average - 0.2).abs() < 1e-6, "average delay {average}");
}

#[tokio::test(start_paused = true)]
async fn test_default_entry_points() {
    let sorted = wait_n(5, 0.2).await.expect("batch should succeed");
    assert_eq!(sorted.len(), 5);
    assert!(sorted.windows(2).all(|w| w[0] <= w[1]));

    let spawned = task_wait_n(5, 0.2).await.expect("batch should succeed");
    assert_eq!(spawned.len(), 5);
    assert!(spawned.iter().all(|d| (0.0..0.2).contains(&d.as_secs_f64())));
}

#[tokio::test(start_paused = true)]
async fn test_custom_clock_is_used_for_suspension() {
    #[derive(Clone)]
    struct HalfSpeed;

    impl Clock for HalfSpeed {
        fn now(&self) -> tokio::time::Instant {
            tokio::time::Instant::now()
        }

        fn sleep(&self, duration: Duration) -> tokio::time::Sleep {
            tokio::time::sleep(duration * 2)
        }
    }

    let mut coordinator = BatchCoordinator::builder()
        .with_random(scripted(&[0.1]))
        .with_clock(HalfSpeed)
        .build();
    let start = TokioClock.now();

    coordinator
        .collect_sorted(1, 1.0)
        .await
        .expect("batch should succeed");

    assert!(start.elapsed() >= Duration::from_millis(200));
}
