//! Clock abstraction for suspension and timing

use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// Source of time for every suspension point and measurement
///
/// Implementations return tokio's `Instant` and `Sleep`, so a runtime with
/// paused time (`#[tokio::test(start_paused = true)]`) makes every wait
/// deterministic without touching the wall clock.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Current instant
    fn now(&self) -> Instant;

    /// Suspend the calling task for `duration`
    fn sleep(&self, duration: Duration) -> Sleep;
}

/// Clock backed by the ambient tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        tokio::time::sleep(duration)
    }
}
