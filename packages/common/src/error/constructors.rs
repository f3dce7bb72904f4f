//! Error constructors and methods

use super::types::{Error, ErrorInner, ErrorKind};
use std::fmt;
use std::sync::Arc;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

impl Error {
    fn build(kind: ErrorKind, context: Option<String>, source: Option<BoxedSource>) -> Self {
        Self {
            inner: Arc::new(ErrorInner {
                kind,
                context,
                source,
                #[cfg(feature = "full-backtrace")]
                backtrace: backtrace::Backtrace::new(),
            }),
        }
    }

    /// Create a new error with the given kind
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self::build(kind, None, None)
    }

    /// Create an error with a source error
    #[must_use]
    pub fn with_source<E>(kind: ErrorKind, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::new(kind).caused_by(source)
    }

    /// Attach `source` as the cause, keeping kind and context
    #[must_use]
    pub fn caused_by<E>(self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::build(
            self.inner.kind.clone(),
            self.inner.context.clone(),
            Some(Box::new(source)),
        )
    }

    /// Add context to this error
    ///
    /// The previous error (with its own context and source) becomes the source
    /// of the returned one, so nothing is lost when context is layered.
    #[must_use]
    pub fn context<C: fmt::Display>(self, context: C) -> Self {
        let kind = self.inner.kind.clone();
        let source = if self.inner.context.is_some() || self.inner.source.is_some() {
            Some(Box::new(self) as BoxedSource)
        } else {
            None
        };
        Self::build(kind, Some(context.to_string()), source)
    }

    /// Add a source location, optionally prefixed by `message`
    ///
    /// Used by [`err!`](crate::err), [`bail!`](crate::bail) and
    /// [`ensure!`](crate::ensure).
    #[must_use]
    pub fn at(self, file: &str, line: u32, message: Option<String>) -> Self {
        match message {
            Some(message) => self.context(format!("{message} at {file}:{line}")),
            None => self.context(format!("at {file}:{line}")),
        }
    }

    /// Get the error kind
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    /// Get the error context if any
    #[must_use]
    pub fn get_context(&self) -> Option<&str> {
        self.inner.context.as_deref()
    }

    /// Get the backtrace
    #[cfg(feature = "full-backtrace")]
    #[must_use]
    pub fn backtrace(&self) -> &backtrace::Backtrace {
        &self.inner.backtrace
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument() -> Self {
        Self::new(ErrorKind::InvalidArgument)
    }

    /// Create an already consumed error
    #[must_use]
    pub fn already_consumed() -> Self {
        Self::new(ErrorKind::AlreadyConsumed)
    }

    /// Create an execution error
    #[must_use]
    pub fn execution() -> Self {
        Self::new(ErrorKind::Execution)
    }

    /// Create a cancelled error
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Create a runtime error
    #[must_use]
    pub fn runtime() -> Self {
        Self::new(ErrorKind::Runtime)
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Create an I/O error
    #[must_use]
    pub fn io() -> Self {
        Self::new(ErrorKind::Io)
    }

    /// Create an internal error
    #[must_use]
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    /// Create an other error with custom message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::Other(msg.into()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io().caused_by(err)
    }
}
