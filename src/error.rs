//! Error handling for spotle.
//!
//! Errors carry a category modelled on gRPC status codes plus the
//! underlying error. Two categories have a fixed meaning in the round
//! engine:
//!
//! * [`ErrorKind::FailedPrecondition`]: an operation was attempted on a
//!   round that is not in the required state, such as guessing after the
//!   round is over. See [`Error::invalid_state`].
//! * [`ErrorKind::OutOfRange`]: the preview audio is shorter than the
//!   requested snippet, or missing altogether. See
//!   [`Error::insufficient_audio`].
//!
//! Missing track metadata is never an error; it degrades to empty hints.
//!
//! # Example
//!
//! ```rust
//! use spotle::error::{Error, ErrorKind, Result};
//!
//! fn guess_again(over: bool) -> Result<()> {
//!     if over {
//!         return Err(Error::invalid_state("round is already over"));
//!     }
//!     Ok(())
//! }
//!
//! let err = guess_again(true).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::FailedPrecondition);
//! assert!(err.is_invalid_state());
//! ```

#![allow(clippy::enum_glob_use)]

use std::fmt;
use thiserror::Error;

/// Main error type combining error kind and details.
#[derive(Debug)]
pub struct Error {
    /// Classification of the error
    pub kind: ErrorKind,

    /// Details of the underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Attempts to downcast the underlying error to a concrete type.
    #[must_use]
    pub fn downcast<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Whether this error signals an operation on a round in the wrong state.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        self.kind == ErrorKind::FailedPrecondition
    }

    /// Whether this error signals audio too short (or absent) for a snippet.
    #[must_use]
    pub fn is_insufficient_audio(&self) -> bool {
        self.kind == ErrorKind::OutOfRange
    }
}

/// Standard result type for spotle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories based on gRPC status codes.
///
/// See [gRPC status codes](https://github.com/googleapis/googleapis/blob/master/google/rpc/code.proto)
/// for the original definitions.
#[expect(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Eq, Error, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u32)]
pub enum ErrorKind {
    #[error("operation was cancelled")]
    Cancelled = 1,

    #[error("unknown error")]
    Unknown = 2,

    #[error("invalid argument specified")]
    InvalidArgument = 3,

    #[error("operation timed out")]
    DeadlineExceeded = 4,

    #[error("not found")]
    NotFound = 5,

    #[error("attempt to create what already exists")]
    AlreadyExists = 6,

    #[error("permission denied")]
    PermissionDenied = 7,

    #[error("resource has been exhausted")]
    ResourceExhausted = 8,

    /// Round is not in the state the operation requires.
    #[error("invalid state")]
    FailedPrecondition = 9,

    #[error("operation aborted")]
    Aborted = 10,

    /// Audio is shorter than the requested snippet.
    #[error("insufficient audio")]
    OutOfRange = 11,

    #[error("not implemented")]
    Unimplemented = 12,

    #[error("internal error")]
    Internal = 13,

    #[error("service unavailable")]
    Unavailable = 14,

    #[error("unrecoverable data loss or corruption")]
    DataLoss = 15,
}

macro_rules! constructors {
    ($($(#[$meta:meta])* $name:ident => $kind:ident;)+) => {
        impl Error {
            $(
                $(#[$meta])*
                pub fn $name<E>(error: E) -> Self
                where
                    E: Into<Box<dyn std::error::Error + Send + Sync>>,
                {
                    Self::new(ErrorKind::$kind, error)
                }
            )+
        }
    };
}

impl Error {
    /// Creates a new error with specified kind and details.
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            kind,
            error: error.into(),
        }
    }
}

constructors! {
    aborted => Aborted;
    already_exists => AlreadyExists;
    cancelled => Cancelled;
    data_loss => DataLoss;
    deadline_exceeded => DeadlineExceeded;
    /// Creates an error for operations that cannot proceed in the current
    /// state. Alias of [`Error::invalid_state`] for non-round preconditions.
    failed_precondition => FailedPrecondition;
    internal => Internal;
    invalid_argument => InvalidArgument;
    /// Creates an error for an operation on a round that is not in the
    /// required state, for example a guess after the round ended.
    invalid_state => FailedPrecondition;
    /// Creates an error for preview audio that is missing or shorter than
    /// the requested snippet length.
    insufficient_audio => OutOfRange;
    not_found => NotFound;
    permission_denied => PermissionDenied;
    resource_exhausted => ResourceExhausted;
    unavailable => Unavailable;
    unimplemented => Unimplemented;
    unknown => Unknown;
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

/// Formats the error as "{kind}: {details}".
impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: ", self.kind)?;
        self.error.fmt(fmt)
    }
}

/// Converts IO errors into appropriate error kinds.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        match err.kind() {
            NotFound => Self::not_found(err),
            PermissionDenied => Self::permission_denied(err),
            AlreadyExists => Self::already_exists(err),
            BrokenPipe | ConnectionReset | ConnectionAborted => Self::aborted(err),
            Interrupted | WouldBlock => Self::cancelled(err),
            UnexpectedEof => Self::data_loss(err),
            TimedOut => Self::deadline_exceeded(err),
            InvalidInput | InvalidData => Self::invalid_argument(err),
            WriteZero => Self::resource_exhausted(err),
            _ => Self::unknown(err),
        }
    }
}

/// Converts JSON errors through IO error mapping.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        std::io::Error::from(err).into()
    }
}

/// Converts TOML parsing errors to `InvalidArgument`.
impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::invalid_argument(e)
    }
}

/// Converts URL parsing errors to `InvalidArgument`.
impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::invalid_argument(e)
    }
}

/// Converts UUID errors to `InvalidArgument`.
impl From<uuid::Error> for Error {
    fn from(e: uuid::Error) -> Self {
        Self::invalid_argument(e)
    }
}

/// Converts mutex poisoning errors to `Internal`.
impl<T> From<std::sync::PoisonError<std::sync::MutexGuard<'_, T>>> for Error {
    fn from(e: std::sync::PoisonError<std::sync::MutexGuard<'_, T>>) -> Self {
        Self::internal(e.to_string())
    }
}

/// Converts Symphonia errors into appropriate error kinds.
///
/// * `IoError` → `DataLoss`
/// * `DecodeError` → `DataLoss`
/// * `LimitError` → `ResourceExhausted`
/// * `ResetRequired` → `Internal`
/// * `SeekError` → `Unavailable`
/// * `Unsupported` → `Unimplemented`
impl From<symphonia::core::errors::Error> for Error {
    fn from(e: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error::*;
        match e {
            IoError(e) => Self::data_loss(e),
            DecodeError(e) => Self::data_loss(e),
            LimitError(e) => Self::resource_exhausted(e),
            ResetRequired => Self::internal("reset required"),
            SeekError(e) => Self::unavailable(format!("seek error: {e:?}")),
            Unsupported(e) => Self::unimplemented(e),
        }
    }
}

/// Converts WAV encoding errors into appropriate error kinds.
impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        use hound::Error::*;
        match e {
            IoError(e) => e.into(),
            Unsupported => Self::unimplemented(e),
            TooWide | InvalidSampleFormat | UnfinishedSample => Self::invalid_argument(e),
            FormatError(_) => Self::data_loss(e),
            #[allow(unreachable_patterns)]
            _ => Self::unknown(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_state_errors_are_failed_preconditions() {
        let err = Error::invalid_state("round is over");
        assert_eq!(err.kind, ErrorKind::FailedPrecondition);
        assert!(err.is_invalid_state());
        assert!(!err.is_insufficient_audio());
    }

    #[test]
    fn short_audio_errors_are_out_of_range() {
        let err = Error::insufficient_audio("1200 ms available, 1500 ms requested");
        assert_eq!(err.kind, ErrorKind::OutOfRange);
        assert!(err.is_insufficient_audio());
        assert_eq!(
            err.to_string(),
            "insufficient audio: 1200 ms available, 1500 ms requested"
        );
    }

    #[test]
    fn io_errors_map_by_kind() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.downcast::<std::io::Error>().is_some());
    }
}
