//! Centralized error types for the amplifier client.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Separates transport failures from protocol failures
//! - Exposes stable machine-readable codes through [`ErrorCode`]

use std::time::Duration;

use thiserror::Error;

use crate::types::{Allowed, Setting};

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across front ends
/// (CLI output, home-automation bridges).
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failures of the byte-level serial transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Read or write failed at the OS level.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial port could not be opened or configured.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// No complete line arrived within the read timeout.
    #[error("read timed out after receiving {} bytes", received.len())]
    TimedOut {
        /// Bytes of the incomplete line received before giving up.
        received: Vec<u8>,
    },

    /// Too many bytes arrived without a line terminator.
    #[error("no line terminator within {limit} bytes")]
    Overflow { limit: usize },

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io_error",
            Self::Serial(_) => "serial_error",
            Self::TimedOut { .. } => "timeout",
            Self::Overflow { .. } => "line_overflow",
            Self::Closed => "transport_closed",
        }
    }
}

/// Convenient Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

// ─────────────────────────────────────────────────────────────────────────────
// Protocol Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Ways a device reply can fail to match the expected framing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedResponse {
    /// Status line shorter than the fixed width.
    #[error("status line is {len} bytes, expected {expected}")]
    TooShort { len: usize, expected: usize },

    /// Status line longer than the fixed width.
    #[error("status line is {len} bytes, expected {expected}")]
    TrailingBytes { len: usize, expected: usize },

    /// The lead marker is not `>`.
    #[error("expected status marker '>', found {found:?}")]
    BadMarker { found: char },

    /// A numeric field holds something other than two ASCII digits.
    #[error("{setting} field at offset {offset} is not numeric")]
    NonDigit { setting: Setting, offset: usize },

    /// A status line arrived where only an acknowledgement was expected.
    #[error("unexpected status line in acknowledgement: {line:?}")]
    UnexpectedStatus { line: String },

    /// A query reply carried no status line where one was required.
    #[error("expected a status line, got {line:?}")]
    MissingStatus { line: String },

    /// A unit reply carried fewer status lines than the unit has zones.
    #[error("unit reply has {found} status lines, expected {expected}")]
    IncompleteUnit { found: usize, expected: usize },

    /// More bytes arrived than any reply holds, with no line terminator.
    #[error("no line terminator within {limit} bytes")]
    LineOverflow { limit: usize },

    /// The reply describes a different zone than the one asked for.
    #[error("asked for zone {expected}, device answered for zone {found}")]
    ZoneMismatch { expected: u8, found: u8 },
}

/// Application-wide error type for amplifier operations.
#[derive(Debug, Error)]
pub enum AmpError {
    /// A caller-supplied value is outside its range. Nothing was sent.
    #[error("invalid {setting} {value}: allowed {allowed}")]
    InvalidArgument {
        setting: Setting,
        value: u8,
        allowed: Allowed,
    },

    /// The device reply does not match the expected framing.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] MalformedResponse),

    /// A decoded field is outside its range.
    #[error("device reported {setting} {value}, outside {allowed}")]
    OutOfRange {
        setting: Setting,
        value: u8,
        allowed: Allowed,
    },

    /// No reply within the read timeout.
    #[error("no reply within {after:?} ({} bytes received)", received.len())]
    Timeout {
        after: Duration,
        /// Partial reply bytes, for diagnostics.
        received: Vec<u8>,
    },

    /// The serial transport failed.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// A zone restore stopped part-way.
    #[error("restore stopped at {failed} after {completed} settings: {source}")]
    Restore {
        /// Number of set-operations that succeeded before the failure.
        completed: usize,
        /// The setting whose set-operation failed.
        failed: Setting,
        source: Box<AmpError>,
    },

    /// The client has been closed.
    #[error("client is closed")]
    Closed,

    /// Client configuration failed validation. Nothing was opened.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AmpError {
    /// Maps a transport failure, turning timeouts into [`AmpError::Timeout`]
    /// and unterminated floods into [`MalformedResponse::LineOverflow`].
    pub(crate) fn from_transport(err: TransportError, after: Duration) -> Self {
        match err {
            TransportError::TimedOut { received } => Self::Timeout { after, received },
            TransportError::Overflow { limit } => MalformedResponse::LineOverflow { limit }.into(),
            TransportError::Closed => Self::Closed,
            other => Self::Transport(other),
        }
    }

    /// True when the transport is unusable and should be reopened.
    #[must_use]
    pub fn is_transport_fatal(&self) -> bool {
        match self {
            Self::Transport(TransportError::Io(_) | TransportError::Serial(_)) => true,
            Self::Restore { source, .. } => source.is_transport_fatal(),
            _ => false,
        }
    }
}

impl ErrorCode for AmpError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::MalformedResponse(_) => "malformed_response",
            Self::OutOfRange { .. } => "out_of_range",
            Self::Timeout { .. } => "timeout",
            Self::Transport(err) => err.code(),
            Self::Restore { .. } => "restore_incomplete",
            Self::Closed => "closed",
            Self::Config(_) => "invalid_config",
        }
    }
}

impl From<TransportError> for AmpError {
    fn from(err: TransportError) -> Self {
        Self::from_transport(err, Duration::ZERO)
    }
}

/// Convenient Result alias for amplifier operations.
pub type AmpResult<T> = Result<T, AmpError>;
