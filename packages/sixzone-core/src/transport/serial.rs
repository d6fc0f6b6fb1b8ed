//! Serial port transports built on the `serialport` crate.
//!
//! [`SerialTransport`] performs blocking reads with a deadline.
//! [`AsyncSerialTransport`] runs the same port on Tokio's blocking pool so
//! callers on the async runtime are suspended rather than blocked.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::{AsyncTransport, Transport};
use crate::engine::framing::LineFramer;
use crate::error::{TransportError, TransportResult};
use crate::protocol_constants::{DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};

/// Size of a single read from the port.
const READ_CHUNK: usize = 64;

/// Line settings for the amplifier's control port.
///
/// Data bits, parity and stop bits are fixed at 8N1 by the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub baud_rate: u32,
    /// Bound on a single blocking write. Reads take their own deadline.
    #[serde(with = "millis")]
    pub timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Blocking
// ─────────────────────────────────────────────────────────────────────────────

/// Blocking serial transport.
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    framer: LineFramer,
    write_timeout: Duration,
}

impl SerialTransport {
    /// Opens `path` (e.g. `/dev/ttyUSB0` or `COM3`) at 8N1.
    ///
    /// # Errors
    /// Returns `Serial` if the port cannot be opened or configured.
    pub fn open(path: &str, settings: &SerialSettings) -> TransportResult<Self> {
        let port = serialport::new(path, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(settings.timeout)
            .open()?;

        log::info!("[Serial] Opened {} at {} baud", path, settings.baud_rate);

        Ok(Self::from_port(port, settings.timeout))
    }

    /// Wraps a port that is already open and configured.
    #[must_use]
    pub fn from_port(port: Box<dyn SerialPort>, write_timeout: Duration) -> Self {
        Self {
            name: port.name().unwrap_or_default(),
            port: Some(port),
            framer: LineFramer::new(),
            write_timeout,
        }
    }

    /// The port path this transport was opened with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn port(&mut self) -> TransportResult<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()> {
        let write_timeout = self.write_timeout;
        let port = self.port()?;
        // Reads leave the port timeout at whatever was left of their deadline.
        port.set_timeout(write_timeout)?;
        port.write_all(bytes)
            .and_then(|()| port.flush())
            .map_err(write_error)
    }

    fn read_line(&mut self, timeout: Duration) -> TransportResult<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(line) = self.framer.next_line()? {
                return Ok(line);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::TimedOut {
                    received: self.framer.pending().to_vec(),
                });
            }

            let port = self.port()?;
            port.set_timeout(remaining)?;
            match port.read(&mut chunk) {
                Ok(n) => self.framer.push(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn discard_input(&mut self) -> TransportResult<()> {
        self.framer.clear();
        self.port()?.clear(ClearBuffer::All)?;
        Ok(())
    }

    fn close(&mut self) -> TransportResult<()> {
        if self.port.take().is_some() {
            log::info!("[Serial] Closed {}", self.name);
        }
        self.framer.clear();
        Ok(())
    }
}

/// A write that hits the port timeout is a timeout, not a dead port.
fn write_error(err: io::Error) -> TransportError {
    if err.kind() == io::ErrorKind::TimedOut {
        TransportError::TimedOut {
            received: Vec::new(),
        }
    } else {
        TransportError::Io(err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Suspending
// ─────────────────────────────────────────────────────────────────────────────

/// Serial transport for async callers.
///
/// Each operation runs the blocking port on `tokio::task::spawn_blocking`,
/// so the calling task is suspended while the I/O is in progress. A read
/// whose future is dropped keeps the port until its own deadline passes.
pub struct AsyncSerialTransport {
    inner: Arc<Mutex<SerialTransport>>,
}

impl AsyncSerialTransport {
    /// Opens `path` at 8N1 without blocking the runtime.
    ///
    /// # Errors
    /// Returns `Serial` if the port cannot be opened or configured.
    pub async fn open(path: &str, settings: &SerialSettings) -> TransportResult<Self> {
        let path = path.to_string();
        let open_settings = settings.clone();
        let transport =
            run_blocking(move || SerialTransport::open(&path, &open_settings)).await?;
        Ok(Self::from_blocking(transport))
    }

    /// Wraps an already-open blocking transport.
    #[must_use]
    pub fn from_blocking(transport: SerialTransport) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transport)),
        }
    }

    async fn with_port<F, R>(&self, op: F) -> TransportResult<R>
    where
        F: FnOnce(&mut SerialTransport) -> TransportResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || op(&mut inner.lock())).await
    }
}

async fn run_blocking<F, R>(op: F) -> TransportResult<R>
where
    F: FnOnce() -> TransportResult<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| TransportError::Io(io::Error::other(e)))?
}

#[async_trait]
impl AsyncTransport for AsyncSerialTransport {
    async fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()> {
        let bytes = bytes.to_vec();
        self.with_port(move |port| port.write_all(&bytes)).await
    }

    async fn read_line(&mut self, timeout: Duration) -> TransportResult<Vec<u8>> {
        self.with_port(move |port| port.read_line(timeout)).await
    }

    async fn discard_input(&mut self) -> TransportResult<()> {
        self.with_port(SerialTransport::discard_input).await
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.with_port(SerialTransport::close).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_device() {
        let settings = SerialSettings::default();
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.timeout, Duration::from_secs(2));
    }

    #[test]
    fn settings_timeout_is_in_millis() {
        let settings: SerialSettings =
            serde_json::from_str(r#"{"baud_rate":19200,"timeout":750}"#).unwrap();
        assert_eq!(settings.baud_rate, 19200);
        assert_eq!(settings.timeout, Duration::from_millis(750));
    }

    #[test]
    fn opening_missing_port_fails() {
        let result = SerialTransport::open("/dev/does-not-exist-sixzone", &SerialSettings::default());
        assert!(matches!(result, Err(TransportError::Serial(_))));
    }

    #[test]
    fn write_timeout_is_not_an_io_failure() {
        let timed_out = write_error(io::Error::new(io::ErrorKind::TimedOut, "write stalled"));
        assert!(matches!(timed_out, TransportError::TimedOut { ref received } if received.is_empty()));

        let broken = write_error(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        assert!(matches!(broken, TransportError::Io(_)));
    }
}

/// Exercises the transports against a pseudo-terminal standing in for the
/// amplifier. The test holds the master end; the transport owns the slave.
#[cfg(all(test, unix))]
mod pty_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use serialport::TTYPort;

    use super::*;
    use crate::{ClientConfig, MonopriceAsync};

    fn pair(write_timeout: Duration) -> (TTYPort, SerialTransport) {
        let (master, slave) = TTYPort::pair().expect("pseudo-terminal pair");
        (master, SerialTransport::from_port(Box::new(slave), write_timeout))
    }

    /// Echoes set-commands back with a terminator and ignores queries.
    fn acking_device(mut master: TTYPort, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            master.set_timeout(Duration::from_millis(20)).unwrap();
            let mut pending = Vec::new();
            let mut chunk = [0u8; 64];
            while !stop.load(Ordering::Relaxed) {
                match master.read(&mut chunk) {
                    Ok(n) => pending.extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                    Err(e) => panic!("device read failed: {e}"),
                }
                while let Some(end) = pending.iter().position(|&b| b == b'\r') {
                    let request: Vec<u8> = pending.drain(..=end).collect();
                    if request.starts_with(b"<") {
                        let mut reply = request;
                        reply.extend_from_slice(b"\r\n#");
                        master.write_all(&reply).unwrap();
                    }
                }
            }
        })
    }

    #[test]
    fn silent_device_times_out_on_deadline() {
        let (_master, mut transport) = pair(Duration::from_secs(1));

        let started = Instant::now();
        let err = transport.read_line(Duration::from_millis(150)).unwrap_err();
        let waited = started.elapsed();

        assert!(matches!(err, TransportError::TimedOut { ref received } if received.is_empty()));
        assert!(waited >= Duration::from_millis(140), "gave up after {waited:?}");
        assert!(waited < Duration::from_secs(1), "gave up after {waited:?}");
    }

    #[test]
    fn line_split_across_writes_is_reassembled() {
        let (mut master, mut transport) = pair(Duration::from_secs(1));
        let device = thread::spawn(move || {
            master.write_all(b"<11PR01\r\r").unwrap();
            master.flush().unwrap();
            thread::sleep(Duration::from_millis(50));
            master.write_all(b"\n#>11").unwrap();
            master.flush().unwrap();
            master
        });

        let line = transport.read_line(Duration::from_secs(1)).unwrap();
        assert_eq!(line, b"<11PR01\r");

        let _master = device.join().unwrap();
        let err = transport.read_line(Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, TransportError::TimedOut { ref received } if received == b">11"));
    }

    #[test]
    fn write_reaches_the_device() {
        let (mut master, mut transport) = pair(Duration::from_secs(1));
        transport.write_all(b"?11\r").unwrap();

        master.set_timeout(Duration::from_millis(500)).unwrap();
        let mut received = [0u8; 4];
        master.read_exact(&mut received).unwrap();
        assert_eq!(&received, b"?11\r");
    }

    #[tokio::test]
    async fn abandoned_read_does_not_hold_up_next_command() {
        let (master, transport) = pair(Duration::from_secs(3));
        let stop = Arc::new(AtomicBool::new(false));
        let device = acking_device(master, Arc::clone(&stop));

        let config = ClientConfig {
            read_timeout: Duration::from_millis(200),
            write_timeout: Duration::from_secs(3),
            ..Default::default()
        };
        let amp = MonopriceAsync::with_transport(AsyncSerialTransport::from_blocking(transport), config);

        let abandoned = tokio::time::timeout(Duration::from_millis(50), amp.zone_status(11)).await;
        assert!(abandoned.is_err());

        let started = Instant::now();
        let result = amp.set_power(11, true).await;
        let waited = started.elapsed();

        stop.store(true, Ordering::Relaxed);
        device.join().unwrap();
        result.unwrap();
        assert!(waited < Duration::from_secs(1), "next command waited {waited:?}");
    }
}
