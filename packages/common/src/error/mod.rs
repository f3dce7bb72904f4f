//! Error handling with context propagation
//!
//! Provides the error handling system shared by the workspace:
//! - Error chaining and context preservation
//! - Backtrace capture and display
//! - Structured error kinds with thiserror
//! - Context attachment for debugging

pub mod constructors;
pub mod display;
pub mod logging;
pub mod macros;
pub mod types;

pub use logging::LoggingTransformer;
pub use types::{Error, ErrorKind, Result};
