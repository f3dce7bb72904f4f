//! Delay-producing unit of work

use crate::error::validate_max_delay;
use crate::{Clock, RandomSource, StdRandom, TaskError, TaskResult, TokioClock};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

/// Default upper bound, in seconds, for a task's random delay
pub const DEFAULT_MAX_DELAY: f64 = 10.0;

/// Seconds of simulated work produced by a [`DelayTask`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delay(f64);

impl Delay {
    /// Delay in seconds
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0
    }

    /// Delay as a `Duration`
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::try_from_secs_f64(self.0).unwrap_or(Duration::ZERO)
    }
}

impl PartialEq for Delay {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Delay {}

impl PartialOrd for Delay {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Delay {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.0)
    }
}

impl From<Delay> for f64 {
    fn from(delay: Delay) -> Self {
        delay.0
    }
}

/// One unit of concurrent work: draw a delay, sleep for it, report it
#[derive(Debug)]
pub struct DelayTask<R, C> {
    max_delay: f64,
    random: R,
    clock: C,
}

impl<R, C> DelayTask<R, C>
where
    R: RandomSource,
    C: Clock,
{
    /// Create a task bounded by `max_delay` seconds
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` if `max_delay` is negative, NaN or
    /// too large to be a `Duration`.
    pub fn new(max_delay: f64, random: R, clock: C) -> TaskResult<Self> {
        validate_max_delay(max_delay)?;
        Ok(Self {
            max_delay,
            random,
            clock,
        })
    }

    /// Upper bound of the delay, in seconds
    #[must_use]
    pub fn max_delay(&self) -> f64 {
        self.max_delay
    }

    /// Run the task to completion
    ///
    /// # Errors
    ///
    /// Returns `TaskError::ExecutionFailed` if the random draw fails.
    pub async fn run(mut self) -> TaskResult<Delay> {
        let drawn = self.random.uniform(self.max_delay)?;
        let pause = Duration::try_from_secs_f64(drawn).map_err(|e| {
            TaskError::execution_failed(format!("drew unusable delay {drawn}: {e}"))
        })?;
        self.clock.sleep(pause).await;
        Ok(Delay(drawn))
    }
}

/// Wait for a random delay in `[0, max_delay)` and return it
///
/// Uses an entropy-seeded generator and the tokio clock.
///
/// # Errors
///
/// Returns `TaskError::InvalidArgument` if `max_delay` is negative.
pub async fn wait_random(max_delay: f64) -> TaskResult<Delay> {
    DelayTask::new(max_delay, StdRandom::from_entropy(), TokioClock)?
        .run()
        .await
}
