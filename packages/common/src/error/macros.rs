//! Error macros that record where an error was raised
//!
//! The first argument names an [`Error`](crate::Error) kind constructor
//! (`invalid_argument`, `configuration`, ...). An optional message follows,
//! either a literal or `format!` arguments.

/// Build an error of the given kind located at the call site
///
/// ```
/// use taskfan_common::{err, ErrorKind};
///
/// let error = err!(configuration, "interval must be positive, got {}", 0);
/// assert_eq!(error.kind(), &ErrorKind::Configuration);
/// ```
#[macro_export]
macro_rules! err {
    ($kind:ident) => {
        $crate::error::Error::$kind().at(file!(), line!(), None)
    };
    ($kind:ident, $($fmt:tt)+) => {
        $crate::error::Error::$kind().at(file!(), line!(), Some(format!($($fmt)+)))
    };
}

/// Return early with [`err!`]
#[macro_export]
macro_rules! bail {
    ($($arg:tt)+) => {
        return Err($crate::err!($($arg)+).into())
    };
}

/// Return early with [`err!`] unless `cond` holds
///
/// Without a message the failed condition itself is recorded.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $kind:ident $(,)?) => {
        if !$cond {
            $crate::bail!($kind, "condition failed: {}", stringify!($cond));
        }
    };
    ($cond:expr, $kind:ident, $($fmt:tt)+) => {
        if !$cond {
            $crate::bail!($kind, $($fmt)+);
        }
    };
}
