//! Sixzone Core - serial control of six-zone whole-home audio amplifiers.
//!
//! The amplifier speaks a line-oriented ASCII protocol over RS-232. Up to
//! three units can be chained, giving zones `11..=16`, `21..=26` and
//! `31..=36`. This crate encodes requests, decodes the fixed-width status
//! replies, and serializes access to the port so concurrent callers never
//! interleave on the wire.
//!
//! # Architecture
//!
//! - [`types`]: Zones, units, settings, zone status and commands
//! - [`validate`]: Range checks applied before anything is sent
//! - [`codec`]: Request encoding and status-line decoding
//! - [`engine`]: One-transaction-at-a-time drivers, blocking and async
//! - [`transport`]: Byte-level transport traits and serial implementations
//! - [`client`]: The [`Monoprice`] and [`MonopriceAsync`] facades
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! [`Transport`] and [`AsyncTransport`] decouple the engine from the serial
//! port. The serial implementations are the defaults; tests and bridges can
//! supply their own.

#![warn(clippy::all)]

pub mod client;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod protocol_constants;
pub mod transport;
pub mod types;
pub mod validate;

// Re-export commonly used types at the crate root
pub use client::{Monoprice, MonopriceAsync};
pub use config::ClientConfig;
pub use error::{AmpError, AmpResult, ErrorCode, MalformedResponse, TransportError, TransportResult};
pub use transport::{AsyncSerialTransport, AsyncTransport, SerialSettings, SerialTransport, Transport};
pub use types::{Allowed, Command, Reply, Setting, Unit, Zone, ZoneStatus, ZoneStatusBuilder};

// Re-export codec entry points
pub use codec::{decode, decode_unit, encode, render_status};
pub use validate::validate;
