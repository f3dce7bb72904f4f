//! Batch coordination: fan out N delay tasks, fan their results back in

use crate::error::{validate_count, validate_max_delay};
use crate::{
    Clock, CompletionRecord, CoordinatorConfig, Delay, DelayTask, FailurePolicy, RandomSource,
    StdRandom, TaskError, TaskHandle, TaskResult, TokioClock,
};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use taskfan_common::LoggingTransformer;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Counters accumulated across every batch a coordinator has run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchMetrics {
    /// Batches that got past argument validation
    pub batches_run: u64,
    /// Tasks created across all batches
    pub tasks_spawned: u64,
    /// Tasks that returned a delay
    pub tasks_completed: u64,
    /// Tasks that returned an error
    pub tasks_failed: u64,
    /// Tasks aborted or dropped before finishing
    pub tasks_cancelled: u64,
    /// Wall-clock time of the most recent batch
    pub last_batch_elapsed: Duration,
    /// Mean delay over every completed task
    pub average_delay: Duration,
}

/// Spawns batches of delay tasks and collects their results
///
/// The coordinator owns the parent [`RandomSource`]; each task gets its own
/// fork at spawn time. All tasks of a batch are created (and, for handle-based
/// contracts, spawned) before the first one is awaited.
pub struct BatchCoordinator<R = StdRandom, C = TokioClock> {
    config: CoordinatorConfig,
    random: R,
    clock: C,
    metrics: BatchMetrics,
}

impl BatchCoordinator {
    /// Coordinator with an entropy-seeded generator and the tokio clock
    #[must_use]
    pub fn new() -> Self {
        CoordinatorBuilder::new().build()
    }

    /// Start configuring a coordinator
    #[must_use]
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> BatchCoordinator<R, C>
where
    R: RandomSource,
    C: Clock,
{
    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Snapshot of the accumulated metrics
    #[must_use]
    pub fn metrics(&self) -> BatchMetrics {
        self.metrics.clone()
    }

    /// Clock used for suspension and timing
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `n` delay tasks concurrently and return their delays in ascending order
    ///
    /// Tasks are driven inside the calling future; no handles are spawned.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` before creating any task if `n` is
    /// zero or `max_delay` is negative, `TaskError::Timeout` if the configured
    /// batch deadline passes, or the first task failure in spawn order.
    pub async fn collect_sorted(&mut self, n: usize, max_delay: f64) -> TaskResult<Vec<Delay>> {
        const CONTRACT: &str = "collect_sorted";
        let tasks = self.prepare(CONTRACT, n, max_delay)?;
        let policy = self.config.failure_policy;
        let started = self.clock.now();
        let mut tally = Tally::default();

        let work = async {
            let mut running: FuturesUnordered<_> = tasks
                .into_iter()
                .enumerate()
                .map(|(spawn_index, task)| async move { (spawn_index, task.run().await) })
                .collect();
            let mut delays = Vec::with_capacity(n);
            let mut first_failure = None;

            while let Some((spawn_index, result)) = running.next().await {
                match result {
                    Ok(delay) => {
                        tally.completed(delay);
                        delays.push(delay);
                    }
                    Err(err) => {
                        tally.failed(CONTRACT, spawn_index, &err);
                        if policy == FailurePolicy::CancelSiblings {
                            return Err(err);
                        }
                        keep_earliest(&mut first_failure, spawn_index, err);
                    }
                }
            }

            match first_failure {
                Some((_, err)) => Err(err),
                None => {
                    delays.sort();
                    Ok(delays)
                }
            }
        };

        let outcome = within_deadline(&self.clock, self.config.batch_timeout(), work).await;
        self.finish(CONTRACT, n, started, &tally, &outcome);
        outcome
    }

    /// Spawn `n` task handles, then join them strictly in spawn order
    ///
    /// The returned delays follow spawn order, not completion or value order.
    /// Under [`FailurePolicy::CancelSiblings`] the first failure met while
    /// joining aborts every handle not yet joined.
    ///
    /// # Errors
    ///
    /// Same as [`collect_sorted`](Self::collect_sorted).
    pub async fn collect_by_spawn_order(
        &mut self,
        n: usize,
        max_delay: f64,
    ) -> TaskResult<Vec<Delay>> {
        const CONTRACT: &str = "collect_by_spawn_order";
        let mut handles = self.spawn_batch(CONTRACT, n, max_delay)?;
        let aborts = abort_handles(&handles);
        let policy = self.config.failure_policy;
        let started = self.clock.now();
        let mut tally = Tally::default();

        let work = async {
            let mut delays = Vec::with_capacity(n);
            let mut first_failure = None;

            for handle in &mut handles {
                match handle.join_record().await {
                    Ok(record) => {
                        tally.completed(record.delay);
                        delays.push(record.delay);
                    }
                    Err(err) => {
                        let spawn_index = handle.spawn_index();
                        tally.failed(CONTRACT, spawn_index, &err);
                        if policy == FailurePolicy::CancelSiblings {
                            aborts.iter().for_each(AbortHandle::abort);
                            return Err(err);
                        }
                        keep_earliest(&mut first_failure, spawn_index, err);
                    }
                }
            }

            match first_failure {
                Some((_, err)) => Err(err),
                None => Ok(delays),
            }
        };

        let outcome = within_deadline(&self.clock, self.config.batch_timeout(), work).await;
        if matches!(outcome, Err(TaskError::Timeout(_))) {
            aborts.iter().for_each(AbortHandle::abort);
        }
        self.finish(CONTRACT, n, started, &tally, &outcome);
        outcome
    }

    /// Spawn `n` task handles and return their records in completion order
    ///
    /// Each record carries its spawn index, so callers can restore spawn order.
    ///
    /// # Errors
    ///
    /// Same as [`collect_sorted`](Self::collect_sorted).
    pub async fn collect_by_completion(
        &mut self,
        n: usize,
        max_delay: f64,
    ) -> TaskResult<Vec<CompletionRecord>> {
        const CONTRACT: &str = "collect_by_completion";
        let mut handles = self.spawn_batch(CONTRACT, n, max_delay)?;
        let aborts = abort_handles(&handles);
        let policy = self.config.failure_policy;
        let started = self.clock.now();
        let mut tally = Tally::default();

        let work = async {
            let mut pending: FuturesUnordered<_> = handles
                .iter_mut()
                .map(|handle| async move { (handle.spawn_index(), handle.join_record().await) })
                .collect();
            let mut records = Vec::with_capacity(n);
            let mut first_failure = None;

            while let Some((spawn_index, result)) = pending.next().await {
                match result {
                    Ok(record) => {
                        tally.completed(record.delay);
                        records.push(record);
                    }
                    Err(err) => {
                        tally.failed(CONTRACT, spawn_index, &err);
                        if policy == FailurePolicy::CancelSiblings {
                            aborts.iter().for_each(AbortHandle::abort);
                            return Err(err);
                        }
                        keep_earliest(&mut first_failure, spawn_index, err);
                    }
                }
            }

            match first_failure {
                Some((_, err)) => Err(err),
                None => Ok(records),
            }
        };

        let outcome = within_deadline(&self.clock, self.config.batch_timeout(), work).await;
        if matches!(outcome, Err(TaskError::Timeout(_))) {
            aborts.iter().for_each(AbortHandle::abort);
        }
        self.finish(CONTRACT, n, started, &tally, &outcome);
        outcome
    }

    /// Validate the batch shape and create `n` tasks, each with a forked generator
    fn prepare(
        &mut self,
        contract: &str,
        n: usize,
        max_delay: f64,
    ) -> TaskResult<Vec<DelayTask<R, C>>> {
        validate_count("n", n)?;
        validate_max_delay(max_delay)?;
        LoggingTransformer::log_batch_started(contract, n, max_delay);

        let tasks = (0..n)
            .map(|_| DelayTask::new(max_delay, self.random.fork(), self.clock.clone()))
            .collect::<TaskResult<Vec<_>>>()?;
        self.metrics.tasks_spawned += n as u64;
        Ok(tasks)
    }

    fn spawn_batch(&mut self, contract: &str, n: usize, max_delay: f64) -> TaskResult<Vec<TaskHandle>> {
        let tasks = self.prepare(contract, n, max_delay)?;
        Ok(tasks
            .into_iter()
            .enumerate()
            .map(|(spawn_index, task)| TaskHandle::spawn(task, spawn_index))
            .collect())
    }

    fn finish<T>(
        &mut self,
        contract: &str,
        n: usize,
        started: Instant,
        tally: &Tally,
        outcome: &TaskResult<T>,
    ) {
        let elapsed = self.clock.now().saturating_duration_since(started);
        let metrics = &mut self.metrics;
        let previously_completed = metrics.tasks_completed;

        metrics.batches_run += 1;
        metrics.tasks_completed += tally.completed;
        metrics.tasks_failed += tally.failed;
        metrics.tasks_cancelled += (n as u64).saturating_sub(tally.completed + tally.failed);
        metrics.last_batch_elapsed = elapsed;

        // Running mean over every completed task
        if metrics.tasks_completed > 0 {
            let total_nanos = metrics.average_delay.as_nanos() * u128::from(previously_completed)
                + tally.delay_total.as_nanos();
            metrics.average_delay = Duration::from_nanos(
                u64::try_from(total_nanos / u128::from(metrics.tasks_completed))
                    .unwrap_or(u64::MAX),
            );
        }

        let failure = outcome.as_ref().err().map(|err| err as &dyn std::error::Error);
        LoggingTransformer::log_batch_completed(contract, n, elapsed, failure);
    }
}

/// Per-batch outcome counters
#[derive(Debug, Default)]
struct Tally {
    completed: u64,
    failed: u64,
    delay_total: Duration,
}

impl Tally {
    fn completed(&mut self, delay: Delay) {
        self.completed += 1;
        self.delay_total += delay.as_duration();
    }

    fn failed(&mut self, contract: &str, spawn_index: usize, err: &TaskError) {
        self.failed += 1;
        LoggingTransformer::log_task_failure(contract, spawn_index, err);
    }
}

/// Keep the failure with the lowest spawn index
fn keep_earliest(slot: &mut Option<(usize, TaskError)>, spawn_index: usize, err: TaskError) {
    match slot {
        Some((kept, _)) if *kept <= spawn_index => {}
        _ => *slot = Some((spawn_index, err)),
    }
}

fn abort_handles(handles: &[TaskHandle]) -> Vec<AbortHandle> {
    handles.iter().filter_map(TaskHandle::abort_handle).collect()
}

/// Race `work` against an optional deadline measured on `clock`
async fn within_deadline<C, T, F>(clock: &C, limit: Option<Duration>, work: F) -> TaskResult<T>
where
    C: Clock,
    F: Future<Output = TaskResult<T>>,
{
    match limit {
        None => work.await,
        Some(limit) => tokio::select! {
            outcome = work => outcome,
            () = clock.sleep(limit) => Err(TaskError::Timeout(limit)),
        },
    }
}

/// Builder for [`BatchCoordinator`] with injectable collaborators
#[must_use]
pub struct CoordinatorBuilder<R = StdRandom, C = TokioClock> {
    config: CoordinatorConfig,
    random: R,
    clock: C,
}

impl CoordinatorBuilder {
    /// Builder with default config, entropy-seeded generator and tokio clock
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
            random: StdRandom::from_entropy(),
            clock: TokioClock,
        }
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> CoordinatorBuilder<R, C>
where
    R: RandomSource,
    C: Clock,
{
    /// Replace the configuration
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Abort batches that run longer than `limit`
    pub fn with_batch_timeout(mut self, limit: Duration) -> Self {
        self.config.batch_timeout_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Use `random` as the parent generator
    pub fn with_random<R2: RandomSource>(self, random: R2) -> CoordinatorBuilder<R2, C> {
        CoordinatorBuilder {
            config: self.config,
            random,
            clock: self.clock,
        }
    }

    /// Use `clock` for every suspension and measurement
    pub fn with_clock<C2: Clock>(self, clock: C2) -> CoordinatorBuilder<R, C2> {
        CoordinatorBuilder {
            config: self.config,
            random: self.random,
            clock,
        }
    }

    /// Finish building
    pub fn build(self) -> BatchCoordinator<R, C> {
        BatchCoordinator {
            config: self.config,
            random: self.random,
            clock: self.clock,
            metrics: BatchMetrics::default(),
        }
    }
}

/// Run `n` delay tasks concurrently with default collaborators; ascending delays
///
/// # Errors
///
/// See [`BatchCoordinator::collect_sorted`].
pub async fn wait_n(n: usize, max_delay: f64) -> TaskResult<Vec<Delay>> {
    BatchCoordinator::new().collect_sorted(n, max_delay).await
}

/// Spawn `n` task handles with default collaborators; delays in spawn order
///
/// # Errors
///
/// See [`BatchCoordinator::collect_by_spawn_order`].
pub async fn task_wait_n(n: usize, max_delay: f64) -> TaskResult<Vec<Delay>> {
    BatchCoordinator::new().collect_by_spawn_order(n, max_delay).await
}
