//! Scripted in-memory transport for tests.
//!
//! Replies are keyed by the exact request bytes, mirroring how the device
//! answers each request. Every write and every line handed back is recorded
//! in a shared wire log so tests can check ordering after the transport has
//! been moved into a client.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{AsyncTransport, Transport};
use crate::engine::framing::LineFramer;
use crate::error::{TransportError, TransportResult};

/// One observable event on the fake wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WireEvent {
    Write(Vec<u8>),
    Read(Vec<u8>),
    Discard,
}

pub(crate) type WireLog = Arc<Mutex<Vec<WireEvent>>>;

/// Groups the log into `(request, lines read before the next write)`.
pub(crate) fn exchanges(log: &[WireEvent]) -> Vec<(Vec<u8>, usize)> {
    let mut out: Vec<(Vec<u8>, usize)> = Vec::new();
    for event in log {
        match event {
            WireEvent::Write(bytes) => out.push((bytes.clone(), 0)),
            WireEvent::Read(_) => {
                if let Some(last) = out.last_mut() {
                    last.1 += 1;
                }
            }
            WireEvent::Discard => {}
        }
    }
    out
}

/// How writes fail once the write budget is spent.
#[derive(Debug, Clone, Copy)]
enum WriteFailure {
    Unplugged,
    TimedOut,
}

pub(crate) struct MockTransport {
    replies: HashMap<Vec<u8>, VecDeque<Vec<u8>>>,
    framer: LineFramer,
    log: WireLog,
    read_delay: Duration,
    fail_after_writes: Option<(usize, WriteFailure)>,
    writes: usize,
    stall_when_empty: bool,
    stall_discard: bool,
    closed: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            framer: LineFramer::new(),
            log: Arc::new(Mutex::new(Vec::new())),
            read_delay: Duration::ZERO,
            fail_after_writes: None,
            writes: 0,
            stall_when_empty: false,
            stall_discard: false,
            closed: false,
        }
    }

    /// Queues `reply` to be received after `request` is written.
    pub fn expect(mut self, request: &[u8], reply: &[u8]) -> Self {
        self.replies
            .entry(request.to_vec())
            .or_default()
            .push_back(reply.to_vec());
        self
    }

    /// Queues the device's acknowledgement (echo and prompt) for a set-command.
    pub fn expect_ack(self, request: &[u8]) -> Self {
        let mut reply = request.to_vec();
        reply.extend_from_slice(b"\r\n#");
        self.expect(request, &reply)
    }

    /// Queues echo plus one status line for a zone query.
    pub fn expect_status(self, request: &[u8], status_line: &str) -> Self {
        let mut reply = request.to_vec();
        reply.extend_from_slice(b"\r\n#");
        reply.extend_from_slice(status_line.as_bytes());
        reply.extend_from_slice(b"\r\n#");
        self.expect(request, &reply)
    }

    /// Sleeps this long before handing out each line.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Fails every write after the first `writes` succeed.
    pub fn failing_after(mut self, writes: usize) -> Self {
        self.fail_after_writes = Some((writes, WriteFailure::Unplugged));
        self
    }

    /// Like [`failing_after`](Self::failing_after), but the writes time out.
    pub fn timing_out_after(mut self, writes: usize) -> Self {
        self.fail_after_writes = Some((writes, WriteFailure::TimedOut));
        self
    }

    /// Async reads with nothing buffered wait forever instead of timing out.
    pub fn stalling(mut self) -> Self {
        self.stall_when_empty = true;
        self
    }

    /// Async discards never complete.
    pub fn stalling_discard(mut self) -> Self {
        self.stall_discard = true;
        self
    }

    pub fn log(&self) -> WireLog {
        Arc::clone(&self.log)
    }

    fn write_frame(&mut self, bytes: &[u8]) -> TransportResult<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if let Some((limit, failure)) = self.fail_after_writes {
            if self.writes >= limit {
                return Err(match failure {
                    WriteFailure::Unplugged => TransportError::Io(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "mock transport unplugged",
                    )),
                    WriteFailure::TimedOut => TransportError::TimedOut {
                        received: Vec::new(),
                    },
                });
            }
        }
        self.writes += 1;
        self.log.lock().push(WireEvent::Write(bytes.to_vec()));
        if let Some(reply) = self.replies.get_mut(bytes).and_then(VecDeque::pop_front) {
            self.framer.push(&reply);
        }
        Ok(())
    }

    fn take_line(&mut self) -> TransportResult<Option<Vec<u8>>> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let line = self.framer.next_line()?;
        if let Some(line) = &line {
            self.log.lock().push(WireEvent::Read(line.clone()));
        }
        Ok(line)
    }

    fn discard(&mut self) {
        self.framer.clear();
        self.log.lock().push(WireEvent::Discard);
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()> {
        self.write_frame(bytes)
    }

    fn read_line(&mut self, _timeout: Duration) -> TransportResult<Vec<u8>> {
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        self.take_line()?.ok_or_else(|| TransportError::TimedOut {
            received: self.framer.pending().to_vec(),
        })
    }

    fn discard_input(&mut self) -> TransportResult<()> {
        self.discard();
        Ok(())
    }

    fn close(&mut self) -> TransportResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[async_trait]
impl AsyncTransport for MockTransport {
    async fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()> {
        self.write_frame(bytes)
    }

    async fn read_line(&mut self, _timeout: Duration) -> TransportResult<Vec<u8>> {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        match self.take_line()? {
            Some(line) => Ok(line),
            None if self.stall_when_empty => std::future::pending().await,
            None => Err(TransportError::TimedOut {
                received: self.framer.pending().to_vec(),
            }),
        }
    }

    async fn discard_input(&mut self) -> TransportResult<()> {
        if self.stall_discard {
            std::future::pending::<()>().await;
        }
        self.discard();
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.closed = true;
        Ok(())
    }
}
