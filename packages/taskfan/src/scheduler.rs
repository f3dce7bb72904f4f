//! The single cooperative scheduler loop

use crate::{TaskError, TaskResult};
use std::future::Future;
use tokio::runtime::{Builder, Runtime};

/// Single-threaded cooperative scheduler
///
/// Wraps a current-thread tokio runtime: every spawned task and every
/// suspension interleaves on one OS thread, nothing runs in parallel.
#[derive(Debug)]
pub struct Scheduler {
    runtime: Runtime,
}

impl Scheduler {
    /// Build a scheduler with the timer enabled
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Runtime` if the runtime cannot be created.
    pub fn new() -> TaskResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| TaskError::Runtime(format!("failed to build scheduler: {e}")))?;
        Ok(Self { runtime })
    }

    /// Drive `future` to completion on this scheduler, blocking the caller
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous context.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
