//! Ferrule error types and native status translation.
//!
//! Every call into the native engine returns an integer status. The
//! translator in this module classifies a non-zero status into a typed
//! failure carrying the numeric code and the engine-supplied description.
//! It performs no retries and never swallows a failure.

use std::fmt;
use thiserror::Error;

use crate::engine::RawEngine;

/// Status value the engine returns for a successful call.
pub const OK: i32 = 0;

/// Numeric failure codes reported by the native engine.
///
/// The numbering follows the engine's stable code table; codes this wrapper
/// has no name for are preserved verbatim in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Operation was interrupted
    Interrupted,
    /// Out of memory
    OutOfMemory,
    /// Invalid argument
    InvalidArgument,
    /// Resource busy
    Busy,
    /// Timed out
    TimedOut,
    /// Connection refused by peer
    ConnectionRefused,
    /// Object closed
    Closed,
    /// Try again (non-blocking call found nothing to do)
    TryAgain,
    /// Not supported
    NotSupported,
    /// Address in use
    AddressInUse,
    /// Incorrect state for operation
    IncorrectState,
    /// Entry not found
    NotFound,
    /// Protocol error
    ProtocolError,
    /// Destination unreachable
    Unreachable,
    /// Address invalid
    AddressInvalid,
    /// Permission denied
    PermissionDenied,
    /// Message too large
    MessageTooLarge,
    /// Connection aborted
    ConnectionAborted,
    /// Connection reset
    ConnectionReset,
    /// Operation canceled
    Canceled,
    /// Option is read-only
    ReadOnly,
    /// Incorrect value type for option
    BadType,
    /// Internal engine error
    Internal,
    /// A code this wrapper has no symbolic name for
    Other(i32),
}

impl ErrorCode {
    /// Map a raw engine status to a code. Zero is not a failure and maps to
    /// `Other(0)`; callers are expected to test for success first.
    #[must_use]
    pub fn from_raw(status: i32) -> Self {
        match status {
            1 => Self::Interrupted,
            2 => Self::OutOfMemory,
            3 => Self::InvalidArgument,
            4 => Self::Busy,
            5 => Self::TimedOut,
            6 => Self::ConnectionRefused,
            7 => Self::Closed,
            8 => Self::TryAgain,
            9 => Self::NotSupported,
            10 => Self::AddressInUse,
            11 => Self::IncorrectState,
            12 => Self::NotFound,
            13 => Self::ProtocolError,
            14 => Self::Unreachable,
            15 => Self::AddressInvalid,
            16 => Self::PermissionDenied,
            17 => Self::MessageTooLarge,
            18 => Self::ConnectionAborted,
            19 => Self::ConnectionReset,
            20 => Self::Canceled,
            24 => Self::ReadOnly,
            30 => Self::BadType,
            1000 => Self::Internal,
            other => Self::Other(other),
        }
    }

    /// The raw numeric value of this code.
    #[must_use]
    pub fn raw(self) -> i32 {
        match self {
            Self::Interrupted => 1,
            Self::OutOfMemory => 2,
            Self::InvalidArgument => 3,
            Self::Busy => 4,
            Self::TimedOut => 5,
            Self::ConnectionRefused => 6,
            Self::Closed => 7,
            Self::TryAgain => 8,
            Self::NotSupported => 9,
            Self::AddressInUse => 10,
            Self::IncorrectState => 11,
            Self::NotFound => 12,
            Self::ProtocolError => 13,
            Self::Unreachable => 14,
            Self::AddressInvalid => 15,
            Self::PermissionDenied => 16,
            Self::MessageTooLarge => 17,
            Self::ConnectionAborted => 18,
            Self::ConnectionReset => 19,
            Self::Canceled => 20,
            Self::ReadOnly => 24,
            Self::BadType => 30,
            Self::Internal => 1000,
            Self::Other(raw) => raw,
        }
    }

    /// Static human-readable description, used when the engine offers none.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Interrupted => "interrupted",
            Self::OutOfMemory => "out of memory",
            Self::InvalidArgument => "invalid argument",
            Self::Busy => "resource busy",
            Self::TimedOut => "timed out",
            Self::ConnectionRefused => "connection refused",
            Self::Closed => "object closed",
            Self::TryAgain => "try again",
            Self::NotSupported => "not supported",
            Self::AddressInUse => "address in use",
            Self::IncorrectState => "incorrect state",
            Self::NotFound => "entry not found",
            Self::ProtocolError => "protocol error",
            Self::Unreachable => "destination unreachable",
            Self::AddressInvalid => "address invalid",
            Self::PermissionDenied => "permission denied",
            Self::MessageTooLarge => "message too large",
            Self::ConnectionAborted => "connection aborted",
            Self::ConnectionReset => "connection reset",
            Self::Canceled => "operation canceled",
            Self::ReadOnly => "read only option",
            Self::BadType => "incorrect option type",
            Self::Internal => "internal engine error",
            Self::Other(_) => "unknown transport error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.raw())
    }
}

/// Main error type for Ferrule operations.
#[derive(Error, Debug)]
pub enum FerruleError {
    /// Any failure reported by the native engine
    #[error("transport error: {description} [{code}]")]
    Transport {
        /// Typed numeric code
        code: ErrorCode,
        /// Engine-supplied description
        description: String,
    },

    /// Operation attempted on an unbound, closed or not-yet-connected entity
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

/// Result type alias for Ferrule operations.
pub type Result<T> = std::result::Result<T, FerruleError>;

impl FerruleError {
    /// Build a transport error from a raw status code and description.
    pub fn transport(status: i32, description: impl Into<String>) -> Self {
        Self::Transport {
            code: ErrorCode::from_raw(status),
            description: description.into(),
        }
    }

    /// The transport code, if this is a transport failure.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Transport { code, .. } => Some(*code),
            Self::InvalidState(_) => None,
        }
    }

    /// True for the "nothing available yet" status of a non-blocking call.
    #[must_use]
    pub fn is_try_again(&self) -> bool {
        self.code() == Some(ErrorCode::TryAgain)
    }

    /// True when the engine reported a timeout.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.code() == Some(ErrorCode::TimedOut)
    }

    /// True when the target object was already closed on the engine side.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.code() == Some(ErrorCode::Closed)
    }
}

/// Translate a native status into a result.
///
/// Zero maps to `Ok(())`; anything else becomes a [`FerruleError::Transport`]
/// with the engine-supplied description. Call sites that acquired a partial
/// resource must release it before handing the status to this function or
/// before propagating the returned error.
pub fn check(engine: &dyn RawEngine, status: i32) -> Result<()> {
    if status == OK {
        Ok(())
    } else {
        Err(FerruleError::Transport {
            code: ErrorCode::from_raw(status),
            description: engine.strerror(status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trips_through_raw() {
        for raw in [1, 5, 7, 8, 10, 15, 20, 30, 1000, 4242] {
            assert_eq!(ErrorCode::from_raw(raw).raw(), raw);
        }
    }

    #[test]
    fn unknown_codes_are_preserved() {
        let code = ErrorCode::from_raw(77);
        assert_eq!(code, ErrorCode::Other(77));
        assert_eq!(code.description(), "unknown transport error");
    }

    #[test]
    fn transport_error_exposes_code() {
        let err = FerruleError::transport(8, "try again");
        assert!(err.is_try_again());
        assert!(!err.is_timed_out());
        assert_eq!(err.code(), Some(ErrorCode::TryAgain));
    }

    #[test]
    fn invalid_state_has_no_code() {
        let err = FerruleError::InvalidState("socket is closed");
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "invalid state: socket is closed");
    }
}
