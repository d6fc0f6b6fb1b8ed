//! Byte-level transport abstractions.
//!
//! The engine needs nothing more than "write these bytes" and "give me the
//! next terminated line". These traits enable dependency injection: the
//! serial implementations in [`serial`] talk to real hardware, tests use a
//! scripted fake.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportResult;

pub mod serial;

#[cfg(test)]
pub(crate) mod mock;

pub use serial::{AsyncSerialTransport, SerialSettings, SerialTransport};

/// Blocking transport: every call parks the calling thread.
pub trait Transport: Send {
    /// Writes all bytes and flushes them to the line.
    fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()>;

    /// Returns the next line without its terminator.
    ///
    /// Fails with `TransportError::TimedOut` if no complete line arrives
    /// within `timeout`.
    fn read_line(&mut self, timeout: Duration) -> TransportResult<Vec<u8>>;

    /// Drops any received but unread bytes, including partial lines.
    fn discard_input(&mut self) -> TransportResult<()>;

    /// Releases the underlying port. Later calls fail with `Closed`.
    fn close(&mut self) -> TransportResult<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()> {
        (**self).write_all(bytes)
    }

    fn read_line(&mut self, timeout: Duration) -> TransportResult<Vec<u8>> {
        (**self).read_line(timeout)
    }

    fn discard_input(&mut self) -> TransportResult<()> {
        (**self).discard_input()
    }

    fn close(&mut self) -> TransportResult<()> {
        (**self).close()
    }
}

/// Suspending transport: every call yields to the scheduler while waiting.
///
/// The engine also bounds every call with `tokio::time::timeout`, but a
/// transport whose I/O outlives a dropped future (e.g. a blocking read on
/// another thread) must honour `timeout` itself so the next call is not
/// held up.
#[async_trait]
pub trait AsyncTransport: Send {
    /// Writes all bytes and flushes them to the line.
    async fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()>;

    /// Returns the next line without its terminator.
    ///
    /// Fails with `TransportError::TimedOut`, carrying any partial line, if
    /// no complete line arrives within `timeout`.
    async fn read_line(&mut self, timeout: Duration) -> TransportResult<Vec<u8>>;

    /// Drops any received but unread bytes, including partial lines.
    async fn discard_input(&mut self) -> TransportResult<()>;

    /// Releases the underlying port. Later calls fail with `Closed`.
    async fn close(&mut self) -> TransportResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for Box<T> {
    async fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()> {
        (**self).write_all(bytes).await
    }

    async fn read_line(&mut self, timeout: Duration) -> TransportResult<Vec<u8>> {
        (**self).read_line(timeout).await
    }

    async fn discard_input(&mut self) -> TransportResult<()> {
        (**self).discard_input().await
    }

    async fn close(&mut self) -> TransportResult<()> {
        (**self).close().await
    }
}
