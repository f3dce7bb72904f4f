//! Configuration for coordinators and sequence aggregation

use crate::task::DEFAULT_MAX_DELAY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use taskfan_common::{ensure, Error, Result};

/// What a batch does when one of its tasks fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Drive every task to completion, then report the first failure in spawn order
    #[default]
    RunToCompletion,
    /// Abort running siblings as soon as one task fails
    CancelSiblings,
}

/// Batch coordinator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Bound used by callers that do not pass their own, in seconds
    #[serde(default = "default_max_delay")]
    pub default_max_delay: f64,
    /// How a batch reacts to a failing task
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Abort the batch after this many milliseconds (absent: wait forever)
    #[serde(default)]
    pub batch_timeout_ms: Option<u64>,
}

impl CoordinatorConfig {
    /// Batch deadline as a `Duration`
    #[must_use]
    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_max_delay: default_max_delay(),
            failure_policy: FailurePolicy::default(),
            batch_timeout_ms: None,
        }
    }
}

/// Shape of every lazy random sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Number of values each sequence yields
    #[serde(default = "default_sequence_length")]
    pub length: usize,
    /// Pause before each yield, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Values are drawn from `[0, upper_bound)`
    #[serde(default = "default_upper_bound")]
    pub upper_bound: f64,
}

impl SequenceConfig {
    /// Inter-yield pause as a `Duration`
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Minimum time one sequence takes to drain
    #[must_use]
    pub fn drain_duration(&self) -> Duration {
        self.interval()
            .saturating_mul(u32::try_from(self.length).unwrap_or(u32::MAX))
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            length: default_sequence_length(),
            interval_ms: default_interval_ms(),
            upper_bound: default_upper_bound(),
        }
    }
}

fn default_max_delay() -> f64 {
    DEFAULT_MAX_DELAY
}

fn default_sequence_length() -> usize {
    10
}

fn default_interval_ms() -> u64 {
    1000 // one value per second
}

fn default_upper_bound() -> f64 {
    10.0
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskfanConfig {
    /// Batch coordinator settings
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    /// Lazy sequence settings
    #[serde(default)]
    pub sequence: SequenceConfig,
}

impl TaskfanConfig {
    /// Parse and validate a JSON document; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the JSON is malformed or a value is
    /// out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            Error::with_source(taskfan_common::ErrorKind::Configuration, e)
                .context("parsing taskfan configuration")
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise the same
    /// errors as [`from_json`](Self::from_json).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::from(e).context(format!("reading {}", path.display())))?;
        Self::from_json(&json)
    }

    /// Check every value is usable
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let max_delay = self.coordinator.default_max_delay;
        ensure!(
            max_delay.is_finite() && max_delay >= 0.0,
            configuration,
            "coordinator.default_max_delay must be a non-negative number, got {}",
            max_delay
        );
        ensure!(
            self.coordinator.batch_timeout_ms != Some(0),
            configuration,
            "coordinator.batch_timeout_ms must be positive when set"
        );
        ensure!(
            self.sequence.length > 0,
            configuration,
            "sequence.length must be positive"
        );
        let upper = self.sequence.upper_bound;
        ensure!(
            upper.is_finite() && upper >= 0.0,
            configuration,
            "sequence.upper_bound must be a non-negative number, got {}",
            upper
        );
        Ok(())
    }
}
