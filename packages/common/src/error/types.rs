//! Core error types and definitions

use std::sync::Arc;
use thiserror::Error;

/// Core error type with context propagation support
#[derive(Debug, Clone)]
pub struct Error {
    /// The actual error
    pub(super) inner: Arc<ErrorInner>,
}

#[derive(Debug)]
pub(super) struct ErrorInner {
    /// The error kind
    pub kind: ErrorKind,
    /// Optional error context
    pub context: Option<String>,
    /// Optional source error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Backtrace captured at error creation
    #[cfg(feature = "full-backtrace")]
    pub backtrace: backtrace::Backtrace,
}

/// Different kinds of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A caller supplied an out-of-range argument
    #[error("Invalid argument")]
    InvalidArgument,

    /// A one-shot result was requested twice
    #[error("Already consumed")]
    AlreadyConsumed,

    /// A unit of work failed while running
    #[error("Execution failed")]
    Execution,

    /// A unit of work was aborted before it finished
    #[error("Cancelled")]
    Cancelled,

    /// Operation timeout
    #[error("Operation timed out")]
    Timeout,

    /// The scheduler could not be built or driven
    #[error("Runtime error")]
    Runtime,

    /// Configuration errors
    #[error("Configuration error")]
    Configuration,

    /// I/O related errors
    #[error("I/O error")]
    Io,

    /// Internal error
    #[error("Internal error")]
    Internal,

    /// Other error with custom message
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
