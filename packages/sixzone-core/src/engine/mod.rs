//! Transaction engine.
//!
//! At most one transaction is in flight per port. A transaction is one
//! request frame plus every reply line it expects; the port lock is held
//! from before the write until the last line has been read, so concurrent
//! callers never interleave on the wire.
//!
//! [`BlockingEngine`] parks the calling thread while it waits for the lock
//! and the device. [`SuspendingEngine`] suspends the calling task instead.
//! Both share the planning and reply interpretation in `transaction`.

pub mod blocking;
pub(crate) mod framing;
pub mod suspending;
pub(crate) mod transaction;

pub use blocking::BlockingEngine;
pub use suspending::SuspendingEngine;

/// A transport plus the bookkeeping the engine keeps about its wire state.
#[derive(Debug)]
pub(crate) struct Link<T> {
    pub transport: T,
    /// A transaction started writing but did not finish reading its reply.
    /// Late bytes from it may still arrive.
    pub contaminated: bool,
    pub closed: bool,
}

impl<T> Link<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            contaminated: false,
            closed: false,
        }
    }
}
