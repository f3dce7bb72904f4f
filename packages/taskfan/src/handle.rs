//! Handles to spawned delay tasks

use crate::{Clock, Delay, DelayTask, RandomSource, StdRandom, TaskError, TaskResult, TokioClock};
use serde::Serialize;
use tokio::task::{AbortHandle, JoinHandle};

/// A finished task's delay tagged with the position it was spawned at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionRecord {
    /// Delay the task produced
    pub delay: Delay,
    /// Zero-based position of the task within its batch
    pub spawn_index: usize,
}

/// A scheduled delay task whose result has not been collected yet
///
/// The handle exclusively owns access to the task's result. Dropping an
/// unconsumed handle detaches the task; it keeps running on the scheduler.
#[derive(Debug)]
pub struct TaskHandle {
    spawn_index: usize,
    inner: Option<JoinHandle<TaskResult<CompletionRecord>>>,
}

impl TaskHandle {
    /// Register `task` with the scheduler and return immediately
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn<R, C>(task: DelayTask<R, C>, spawn_index: usize) -> Self
    where
        R: RandomSource,
        C: Clock,
    {
        tracing::debug!(spawn_index, max_delay = task.max_delay(), "Spawning delay task");
        let inner = tokio::spawn(async move {
            let delay = task.run().await?;
            Ok(CompletionRecord { delay, spawn_index })
        });
        Self {
            spawn_index,
            inner: Some(inner),
        }
    }

    /// Position of this task within its batch
    #[must_use]
    pub fn spawn_index(&self) -> usize {
        self.spawn_index
    }

    /// Whether the task has stopped running (or its result was already taken)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Whether the result has already been taken
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.inner.is_none()
    }

    /// Abort the underlying task; a later `join` reports `Cancelled`
    pub fn abort(&self) {
        if let Some(inner) = &self.inner {
            inner.abort();
        }
    }

    pub(crate) fn abort_handle(&self) -> Option<AbortHandle> {
        self.inner.as_ref().map(JoinHandle::abort_handle)
    }

    /// Wait for the task and take its delay
    ///
    /// # Errors
    ///
    /// Returns `TaskError::AlreadyConsumed` on every call after the first one
    /// that completed, `TaskError::Cancelled` if the task was aborted, or the
    /// task's own failure.
    pub async fn join(&mut self) -> TaskResult<Delay> {
        self.join_record().await.map(|record| record.delay)
    }

    /// Wait for the task and take its [`CompletionRecord`]
    ///
    /// Cancel-safe: if the returned future is dropped before the task
    /// finishes, the handle keeps ownership and can be joined again.
    ///
    /// # Errors
    ///
    /// Same as [`join`](Self::join).
    pub async fn join_record(&mut self) -> TaskResult<CompletionRecord> {
        let inner = self.inner.as_mut().ok_or(TaskError::AlreadyConsumed {
            spawn_index: self.spawn_index,
        })?;
        let outcome = inner.await;
        self.inner = None;
        outcome?
    }
}

/// Spawn a single delay task with default collaborators
///
/// # Errors
///
/// Returns `TaskError::InvalidArgument` if `max_delay` is negative.
///
/// # Panics
///
/// Panics if called outside of a tokio runtime.
pub fn task_wait_random(max_delay: f64) -> TaskResult<TaskHandle> {
    let task = DelayTask::new(max_delay, StdRandom::from_entropy(), TokioClock)?;
    Ok(TaskHandle::spawn(task, 0))
}
