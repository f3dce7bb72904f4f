//! Error types for task coordination

use std::time::Duration;
use taskfan_common::Error;
use thiserror::Error;

/// Errors raised while spawning, running or collecting tasks
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// A count or bound was rejected before any work started
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The handle's result was already taken
    #[error("Task handle {spawn_index} was already consumed")]
    AlreadyConsumed {
        /// Position of the handle within its batch
        spawn_index: usize,
    },

    /// A random draw failed or the task panicked
    #[error("Task execution failed: {0}")]
    ExecutionFailed(String),

    /// The task was aborted before it finished
    #[error("Task was cancelled")]
    Cancelled,

    /// The batch deadline passed
    #[error("Batch timed out after {0:?}")]
    Timeout(Duration),

    /// The scheduler could not be built
    #[error("Scheduler error: {0}")]
    Runtime(String),
}

impl TaskError {
    /// Create an `InvalidArgument` error
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an `ExecutionFailed` error
    #[must_use]
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}

impl From<tokio::task::JoinError> for TaskError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::ExecutionFailed(format!("task panicked: {err}"))
        }
    }
}

impl From<TaskError> for Error {
    fn from(err: TaskError) -> Self {
        let base = match &err {
            TaskError::InvalidArgument(_) => Error::invalid_argument(),
            TaskError::AlreadyConsumed { .. } => Error::already_consumed(),
            TaskError::ExecutionFailed(_) => Error::execution(),
            TaskError::Cancelled => Error::cancelled(),
            TaskError::Timeout(_) => Error::timeout(),
            TaskError::Runtime(_) => Error::runtime(),
        };
        base.caused_by(err)
    }
}

/// Result type for task operations
pub type TaskResult<T> = Result<T, TaskError>;

/// Validate a delay bound, returning it as a `Duration`
pub(crate) fn validate_max_delay(max_delay: f64) -> TaskResult<Duration> {
    if max_delay.is_nan() || max_delay < 0.0 {
        return Err(TaskError::invalid_argument(format!(
            "max_delay must be a non-negative number of seconds, got {max_delay}"
        )));
    }
    Duration::try_from_secs_f64(max_delay).map_err(|e| {
        TaskError::invalid_argument(format!("max_delay {max_delay} is not a valid duration: {e}"))
    })
}

/// Validate the upper bound of a sequence draw
pub(crate) fn validate_upper_bound(upper_bound: f64) -> TaskResult<()> {
    if !upper_bound.is_finite() || upper_bound < 0.0 {
        return Err(TaskError::invalid_argument(format!(
            "upper_bound must be a finite, non-negative number, got {upper_bound}"
        )));
    }
    Ok(())
}

/// Validate a batch or fan-out size
pub(crate) fn validate_count(name: &str, count: usize) -> TaskResult<()> {
    if count == 0 {
        return Err(TaskError::invalid_argument(format!(
            "{name} must be positive, got 0"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskfan_common::ErrorKind;

    #[test]
    fn rejects_negative_nan_and_infinite_bounds() {
        assert!(validate_max_delay(-0.5).is_err());
        assert!(validate_max_delay(f64::NAN).is_err());
        assert!(validate_max_delay(f64::INFINITY).is_err());
        assert_eq!(validate_max_delay(0.0), Ok(Duration::ZERO));
        assert_eq!(validate_max_delay(1.5), Ok(Duration::from_millis(1500)));
    }

    #[test]
    fn rejects_non_finite_upper_bounds() {
        assert!(validate_upper_bound(f64::INFINITY).is_err());
        assert!(validate_upper_bound(f64::NAN).is_err());
        assert!(validate_upper_bound(-1.0).is_err());
        assert_eq!(validate_upper_bound(0.0), Ok(()));
        assert_eq!(validate_upper_bound(10.0), Ok(()));
    }

    #[test]
    fn converts_into_common_error() {
        let err: Error = TaskError::AlreadyConsumed { spawn_index: 2 }.into();
        assert_eq!(err.kind(), &ErrorKind::AlreadyConsumed);
        assert!(err.to_string().contains("Task handle 2 was already consumed"));

        let err: Error = TaskError::Timeout(Duration::from_millis(100)).into();
        assert_eq!(err.kind(), &ErrorKind::Timeout);
        let err: Error = TaskError::ExecutionFailed("boom".into()).into();
        assert_eq!(err.kind(), &ErrorKind::Execution);
        let err: Error = TaskError::Runtime("no timer".into()).into();
        assert_eq!(err.kind(), &ErrorKind::Runtime);
    }
}
