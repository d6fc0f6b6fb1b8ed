//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the amplifier's RS-232 control protocol and
//! changing them would break compatibility with the device firmware.

use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Serial Line
// ─────────────────────────────────────────────────────────────────────────────

/// Baud rate the amplifier's control port is fixed at (8N1).
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default bound on a single serial read or write.
///
/// Two seconds comfortably covers a 7-line unit query at 9600 baud.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

// ─────────────────────────────────────────────────────────────────────────────
// Framing
// ─────────────────────────────────────────────────────────────────────────────

/// Terminator appended to every request.
pub const REQUEST_TERMINATOR: u8 = b'\r';

/// Terminator the device emits after every echoed request and status line.
///
/// The trailing `#` is the device prompt, so a line is complete only once
/// the prompt has been seen.
pub const LINE_TERMINATOR: &[u8] = b"\r\n#";

/// Lead byte of a set command.
pub const SET_PREFIX: u8 = b'<';

/// Lead byte of a query.
pub const QUERY_PREFIX: u8 = b'?';

/// Lead marker of a status line.
pub const STATUS_MARKER: u8 = b'>';

/// Width of every numeric field (zone ids and values alike).
pub const FIELD_WIDTH: usize = 2;

/// Number of numeric fields in a status line.
pub const STATUS_FIELD_COUNT: usize = 11;

/// Exact length of a status line without its terminator.
pub const STATUS_LINE_LEN: usize = 1 + FIELD_WIDTH * STATUS_FIELD_COUNT;

/// Number of zones on one amplifier unit.
pub const ZONES_PER_UNIT: u8 = 6;

/// Maximum number of chained amplifier units.
pub const MAX_UNITS: u8 = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Reply Shape
// ─────────────────────────────────────────────────────────────────────────────

/// Lines read after a set command (the echoed request).
pub const ACK_LINES: usize = 1;

/// Lines read after a zone query (echo, then one status line).
pub const ZONE_QUERY_LINES: usize = 2;

/// Lines read after a unit query (echo, then one status line per zone).
pub const UNIT_QUERY_LINES: usize = 1 + ZONES_PER_UNIT as usize;

/// Upper bound on buffered reply bytes before the framer gives up.
///
/// A unit reply is well under 256 bytes; anything larger is line noise.
pub const MAX_LINE_BYTES: usize = 512;
