//! Display and trait implementations for Error
//!
//! An error prints as `kind: context`, followed by one `Caused by:` line per
//! layer of its source chain. The alternate form (`{:#}`) also prints the
//! backtrace captured when the outermost layer was created.

use super::types::Error;
use std::fmt;

impl Error {
    /// Write only this layer: kind and context, no sources
    fn fmt_layer(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.kind)?;
        if let Some(context) = &self.inner.context {
            write!(f, ": {context}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_layer(f)?;

        let mut next = std::error::Error::source(self);
        while let Some(cause) = next {
            f.write_str("\nCaused by: ")?;
            // Layers of our own type would otherwise print their whole chain again
            match cause.downcast_ref::<Error>() {
                Some(layer) => layer.fmt_layer(f)?,
                None => write!(f, "{cause}")?,
            }
            next = cause.source();
        }

        #[cfg(feature = "full-backtrace")]
        if f.alternate() {
            write!(f, "\n\nBacktrace:\n{:?}", self.backtrace())?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
