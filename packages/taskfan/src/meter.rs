//! Wall-clock measurement of whole batches
//!
//! A batch of `n` tasks with delays drawn from `[0, max_delay)` that really
//! runs concurrently finishes in roughly the longest single delay, so the
//! amortized per-task time shrinks as `n` grows. A serialized batch would
//! instead report close to `max_delay / 2` per task.

use crate::error::{validate_count, validate_max_delay};
use crate::{BatchCoordinator, Clock, Scheduler, TaskResult, TokioClock};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use taskfan_common::LoggingTransformer;

/// Outcome of one measured batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// Number of tasks in the batch
    pub tasks: usize,
    /// Elapsed wall-clock time for the whole batch
    pub total: Duration,
    /// `total / tasks`
    pub per_task: Duration,
}

impl Measurement {
    /// Amortized per-task cost in seconds
    #[must_use]
    pub fn per_task_secs(&self) -> f64 {
        self.per_task.as_secs_f64()
    }

    /// Total elapsed time in seconds
    #[must_use]
    pub fn total_secs(&self) -> f64 {
        self.total.as_secs_f64()
    }
}

/// Times batch operations against a [`Clock`]
#[derive(Debug, Clone, Default)]
pub struct RuntimeMeter<C = TokioClock> {
    clock: C,
}

impl RuntimeMeter {
    /// Meter on the tokio clock
    #[must_use]
    pub fn new() -> Self {
        Self { clock: TokioClock }
    }
}

impl<C: Clock> RuntimeMeter<C> {
    /// Meter on a custom clock
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Run `batch(n, max_delay)` to completion and report its timing
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` before invoking `batch` if `n` is
    /// zero or `max_delay` is negative, otherwise whatever `batch` returns.
    pub async fn measure<F, Fut, T>(
        &self,
        n: usize,
        max_delay: f64,
        batch: F,
    ) -> TaskResult<Measurement>
    where
        F: FnOnce(usize, f64) -> Fut,
        Fut: Future<Output = TaskResult<T>>,
    {
        validate_count("n", n)?;
        validate_max_delay(max_delay)?;

        let start = self.clock.now();
        let outcome = batch(n, max_delay).await;
        let total = self.clock.now().saturating_duration_since(start);
        #[allow(clippy::cast_precision_loss)]
        let per_task = total.div_f64(n as f64);

        LoggingTransformer::log_performance_metric("measure", per_task, outcome.is_ok());
        outcome?;
        Ok(Measurement {
            tasks: n,
            total,
            per_task,
        })
    }

    /// Blocking variant of [`measure`](Self::measure) driven by `scheduler`
    ///
    /// # Errors
    ///
    /// Same as [`measure`](Self::measure).
    pub fn measure_blocking<F, Fut, T>(
        &self,
        scheduler: &Scheduler,
        n: usize,
        max_delay: f64,
        batch: F,
    ) -> TaskResult<Measurement>
    where
        F: FnOnce(usize, f64) -> Fut,
        Fut: Future<Output = TaskResult<T>>,
    {
        scheduler.block_on(self.measure(n, max_delay, batch))
    }
}

/// Per-task seconds for a sorted batch of `n` tasks on a fresh scheduler
///
/// # Errors
///
/// Returns `TaskError::Runtime` if the scheduler cannot be built, otherwise
/// the errors of [`BatchCoordinator::collect_sorted`].
pub fn measure_time(n: usize, max_delay: f64) -> TaskResult<f64> {
    let scheduler = Scheduler::new()?;
    let measurement =
        RuntimeMeter::new().measure_blocking(&scheduler, n, max_delay, |n, max_delay| async move {
            BatchCoordinator::new().collect_sorted(n, max_delay).await
        })?;
    Ok(measurement.per_task_secs())
}
