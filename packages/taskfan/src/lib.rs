//! # Concurrent Task Coordination
//!
//! Fan out batches of random-delay tasks on a single tokio scheduler, fan
//! their results back in under different ordering contracts, and measure how
//! long the whole batch took. A sibling pipeline drains several lazy, time-paced
//! random sequences concurrently.
//!
//! - [`DelayTask`]: draw a delay in `[0, max_delay)`, sleep for it, return it.
//! - [`TaskHandle`]: a spawned task whose result can be taken exactly once.
//! - [`BatchCoordinator`]: `collect_sorted` (value order) and
//!   `collect_by_spawn_order` (spawn order), plus `collect_by_completion`.
//! - [`RuntimeMeter`]: elapsed time of a batch and its per-task average.
//! - [`SequenceAggregator`]: drain `k` [`RandomSequence`]s concurrently.
//!
//! Randomness ([`RandomSource`]) and time ([`Clock`]) are injected, so tests
//! can run deterministically on tokio's paused clock.
//!
//! ```no_run
//! use taskfan::{BatchCoordinator, LoggingTransformer, Scheduler};
//!
//! # fn main() -> taskfan::TaskResult<()> {
//! LoggingTransformer::init();
//! let scheduler = Scheduler::new()?;
//! let delays = scheduler.block_on(async {
//!     BatchCoordinator::new().collect_sorted(5, 0.1).await
//! })?;
//! assert_eq!(delays.len(), 5);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod handle;
pub mod meter;
pub mod random;
pub mod scheduler;
pub mod sequence;
pub mod task;

pub use clock::{Clock, TokioClock};
pub use config::{CoordinatorConfig, FailurePolicy, SequenceConfig, TaskfanConfig};
pub use error::{TaskError, TaskResult};
pub use executor::{task_wait_n, wait_n, BatchCoordinator, BatchMetrics, CoordinatorBuilder};
pub use handle::{task_wait_random, CompletionRecord, TaskHandle};
pub use meter::{measure_time, Measurement, RuntimeMeter};
pub use random::{RandomSource, ScriptedRandom, StdRandom};
pub use scheduler::Scheduler;
pub use sequence::{
    drain_all, random_sequence, AggregateReport, RandomSequence, SequenceAggregator,
};
pub use task::{wait_random, Delay, DelayTask, DEFAULT_MAX_DELAY};
pub use taskfan_common::LoggingTransformer;
