//! Structured logging infrastructure
//!
//! Provides env_logger-based logging integrated with the standard log crate.
//! `tracing` events emitted by the coordinator are forwarded to the same
//! facade through tracing's `log` feature.

use log::{debug, error, info, warn};
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Logging infrastructure using `env_logger`
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging system (should be called once at application startup)
    ///
    /// Configure logging levels via `RUST_LOG` environment variable:
    /// - `RUST_LOG=debug` - Enable per-task spawn and completion events
    /// - `RUST_LOG=info` - Batch summaries and measurements
    /// - `RUST_LOG=taskfan=debug,taskfan_common=info` - Module-specific levels
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    ///
    /// Use this in test modules to avoid initialization conflicts
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log the start of a batch with its shape
    pub fn log_batch_started(contract: &str, tasks: usize, max_delay: f64) {
        debug!("Batch started: {contract} (tasks: {tasks}, max_delay: {max_delay}s)");
    }

    /// Log the end of a batch, with the error it returned if any
    pub fn log_batch_completed(
        contract: &str,
        tasks: usize,
        elapsed: Duration,
        failure: Option<&dyn std::error::Error>,
    ) {
        match failure {
            None => info!("Batch completed: {contract} (tasks: {tasks}, elapsed: {elapsed:?})"),
            Some(error) => warn!(
                "Batch failed: {contract} (tasks: {tasks}, elapsed: {elapsed:?}, error: {error})"
            ),
        }
    }

    /// Log a single task failure inside a batch
    pub fn log_task_failure(operation: &str, spawn_index: usize, error: &dyn std::error::Error) {
        error!(
            "Task failed: {} (spawn_index: {}, error_type: {}, error: {})",
            operation,
            spawn_index,
            std::any::type_name_of_val(error),
            error
        );
    }

    /// Log performance metrics and timing information
    pub fn log_performance_metric(operation: &str, per_task: Duration, success: bool) {
        if success {
            debug!("Performance: {operation} averaged {per_task:?} per task");
        } else {
            warn!("Performance: {operation} failed after {per_task:?} per task");
        }
    }

    /// Log completion of a concurrent sequence drain
    pub fn log_sequence_drain(sequences: usize, values: usize, elapsed: Duration) {
        info!("Drained {sequences} sequences ({values} values) in {elapsed:?}");
    }
}
