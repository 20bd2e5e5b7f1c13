use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::diagnostics::Diagnostic;

/// Unified error type for the binder.
///
/// `Binding` carries a recoverable failure that callers fold into a rule according
/// to their error policy; `Internal` marks a broken invariant in the binder itself.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Binding(Diagnostic),
    Config {
        message: String,
    },
    Internal {
        message: String,
        backtrace: Option<Backtrace>,
    },
}

/// Convenience result alias used across the binder.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Construct a new internal binder error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: capture_backtrace(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Return the captured backtrace, if any.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            Error::Internal { backtrace, .. } => backtrace.as_ref(),
            _ => None,
        }
    }

    /// The diagnostic of a recoverable binding failure.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::Binding(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }
}

fn capture_backtrace() -> Option<Backtrace> {
    if cfg!(debug_assertions) {
        Some(Backtrace::force_capture())
    } else {
        None
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Binding(diagnostic) => write!(f, "{diagnostic}"),
            Error::Config { message } => write!(f, "configuration error: {message}"),
            Error::Internal { message, .. } => write!(f, "internal error: {message}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Binding(_) | Error::Config { .. } | Error::Internal { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<Diagnostic> for Error {
    fn from(diagnostic: Diagnostic) -> Self {
        Error::Binding(diagnostic)
    }
}
