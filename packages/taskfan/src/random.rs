//! Injectable randomness for delay and sequence draws
//!
//! Every task owns its own generator. A coordinator holds one parent source
//! and hands each spawned task a [`RandomSource::fork`] of it, so no generator
//! state is ever shared between concurrently running units.

use crate::{TaskError, TaskResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Source of uniform random draws
pub trait RandomSource: Send + 'static {
    /// Draw a value uniformly from `[0, upper)`.
    ///
    /// A degenerate bound (`upper == 0`) yields `0.0`.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` if `upper` is NaN or infinite, or
    /// `TaskError::ExecutionFailed` if the source cannot produce a value.
    fn uniform(&mut self, upper: f64) -> TaskResult<f64>;

    /// Derive an independent source for a newly spawned unit of work
    fn fork(&mut self) -> Self
    where
        Self: Sized;
}

/// `StdRng`-backed source, seeded from the OS or from a fixed seed
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Create a source seeded from operating system entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a reproducible source from a fixed seed
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Reject bounds no uniform range can be built from
fn check_upper(upper: f64) -> TaskResult<()> {
    if upper.is_finite() {
        Ok(())
    } else {
        Err(TaskError::invalid_argument(format!(
            "cannot draw from [0, {upper})"
        )))
    }
}

impl RandomSource for StdRandom {
    fn uniform(&mut self, upper: f64) -> TaskResult<f64> {
        check_upper(upper)?;
        if upper <= 0.0 {
            return Ok(0.0);
        }
        Ok(self.rng.random_range(0.0..upper))
    }

    fn fork(&mut self) -> Self {
        Self {
            rng: StdRng::from_rng(&mut self.rng),
        }
    }
}

/// Replays a fixed script of values
///
/// Draws walk the script cyclically starting at the source's cursor. Each
/// [`fork`](RandomSource::fork) starts the child at the parent's cursor and
/// advances the parent by one, so the `i`th task forked from a fresh source
/// draws `values[i]` first. A scripted value outside `[0, upper)` is reported
/// as a failed draw, which makes the script usable for fault injection.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Arc<[f64]>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Create a source replaying `values`
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` if `values` is empty.
    pub fn new(values: impl Into<Vec<f64>>) -> TaskResult<Self> {
        let values = values.into();
        if values.is_empty() {
            return Err(TaskError::invalid_argument(
                "scripted random source needs at least one value",
            ));
        }
        Ok(Self {
            values: values.into(),
            cursor: 0,
        })
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, upper: f64) -> TaskResult<f64> {
        check_upper(upper)?;
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        let in_range = if upper <= 0.0 {
            value == 0.0
        } else {
            (0.0..upper).contains(&value)
        };
        if in_range {
            Ok(value)
        } else {
            Err(TaskError::execution_failed(format!(
                "scripted value {value} outside [0, {upper})"
            )))
        }
    }

    fn fork(&mut self) -> Self {
        let child = Self {
            values: Arc::clone(&self.values),
            cursor: self.cursor,
        };
        self.cursor += 1;
        child
    }
}
