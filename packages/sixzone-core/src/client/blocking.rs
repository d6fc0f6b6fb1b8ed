//! Thread-blocking client.

use super::{into_ack, into_status, into_unit};
use crate::config::ClientConfig;
use crate::engine::BlockingEngine;
use crate::error::{AmpError, AmpResult};
use crate::transport::{SerialTransport, Transport};
use crate::types::{Command, ZoneStatus};

/// Blocking amplifier client.
///
/// `Send + Sync`: wrap it in an `Arc` to share one port between threads.
/// Calls from different threads run one at a time.
///
/// # Example
///
/// ```no_run
/// use sixzone_core::{ClientConfig, Monoprice};
///
/// let amp = Monoprice::open("/dev/ttyUSB0", ClientConfig::default())?;
/// amp.set_power(11, true)?;
/// amp.set_volume(11, 20)?;
/// println!("{:?}", amp.zone_status(11)?);
/// # Ok::<(), sixzone_core::AmpError>(())
/// ```
pub struct Monoprice<T: Transport = SerialTransport> {
    engine: BlockingEngine<T>,
}

impl Monoprice<SerialTransport> {
    /// Opens the amplifier on serial `port`.
    pub fn open(port: &str, config: ClientConfig) -> AmpResult<Self> {
        config.validate().map_err(AmpError::Config)?;
        let transport = SerialTransport::open(port, &config.serial_settings())?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> Monoprice<T> {
    /// Uses an already-open transport.
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            engine: BlockingEngine::new(transport, config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.engine.config()
    }

    /// Current state of `zone`.
    pub fn zone_status(&self, zone: u8) -> AmpResult<ZoneStatus> {
        into_status(self.engine.execute(Command::QueryStatus { zone })?)
    }

    /// State of all six zones of `unit` (1-3), in zone order.
    pub fn all_zone_status(&self, unit: u8) -> AmpResult<Vec<ZoneStatus>> {
        into_unit(self.engine.execute(Command::QueryUnit { unit })?)
    }

    pub fn set_power(&self, zone: u8, on: bool) -> AmpResult<()> {
        self.set(Command::SetPower { zone, on })
    }

    pub fn set_mute(&self, zone: u8, on: bool) -> AmpResult<()> {
        self.set(Command::SetMute { zone, on })
    }

    /// Volume `0..=38`.
    pub fn set_volume(&self, zone: u8, level: u8) -> AmpResult<()> {
        self.set(Command::SetVolume { zone, level })
    }

    /// Source input `1..=4`.
    pub fn set_source(&self, zone: u8, source: u8) -> AmpResult<()> {
        self.set(Command::SetSource { zone, source })
    }

    /// Treble `0..=14`, flat at 7.
    pub fn set_treble(&self, zone: u8, level: u8) -> AmpResult<()> {
        self.set(Command::SetTreble { zone, level })
    }

    /// Bass `0..=14`, flat at 7.
    pub fn set_bass(&self, zone: u8, level: u8) -> AmpResult<()> {
        self.set(Command::SetBass { zone, level })
    }

    /// Balance `0..=20`, centred at 10.
    pub fn set_balance(&self, zone: u8, level: u8) -> AmpResult<()> {
        self.set(Command::SetBalance { zone, level })
    }

    pub fn set_pa(&self, zone: u8, on: bool) -> AmpResult<()> {
        self.set(Command::SetPa { zone, on })
    }

    pub fn set_dnd(&self, zone: u8, on: bool) -> AmpResult<()> {
        self.set(Command::SetDnd { zone, on })
    }

    /// Brings the zone in `status` back to that state.
    ///
    /// Issues nine set-commands (power, mute, volume, treble, bass, balance,
    /// source, PA, do-not-disturb) while holding the port, so other callers
    /// wait until the whole restore is done. Not atomic on the device: a
    /// failure leaves the earlier steps applied. See [`AmpError::Restore`].
    pub fn restore_zone(&self, status: &ZoneStatus) -> AmpResult<()> {
        into_ack(self.engine.execute(Command::RestoreZone(*status))?)
    }

    /// Releases the serial port.
    pub fn close(&self) -> AmpResult<()> {
        self.engine.close()
    }

    fn set(&self, command: Command) -> AmpResult<()> {
        into_ack(self.engine.execute(command)?)
    }
}
