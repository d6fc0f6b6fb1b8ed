//! Async client for Tokio.

use super::{into_ack, into_status, into_unit};
use crate::config::ClientConfig;
use crate::engine::SuspendingEngine;
use crate::error::{AmpError, AmpResult};
use crate::transport::{AsyncSerialTransport, AsyncTransport};
use crate::types::{Command, ZoneStatus};

/// Async amplifier client.
///
/// Same operations as [`Monoprice`](super::Monoprice); waiting for the port
/// or the device suspends the task. Must be used inside a Tokio runtime.
/// Share between tasks with an `Arc`.
pub struct MonopriceAsync<T: AsyncTransport = AsyncSerialTransport> {
    engine: SuspendingEngine<T>,
}

impl MonopriceAsync<AsyncSerialTransport> {
    /// Opens the amplifier on serial `port`.
    pub async fn open(port: &str, config: ClientConfig) -> AmpResult<Self> {
        config.validate().map_err(AmpError::Config)?;
        let transport = AsyncSerialTransport::open(port, &config.serial_settings()).await?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: AsyncTransport> MonopriceAsync<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            engine: SuspendingEngine::new(transport, config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.engine.config()
    }

    pub async fn zone_status(&self, zone: u8) -> AmpResult<ZoneStatus> {
        into_status(self.engine.execute(Command::QueryStatus { zone }).await?)
    }

    pub async fn all_zone_status(&self, unit: u8) -> AmpResult<Vec<ZoneStatus>> {
        into_unit(self.engine.execute(Command::QueryUnit { unit }).await?)
    }

    pub async fn set_power(&self, zone: u8, on: bool) -> AmpResult<()> {
        self.set(Command::SetPower { zone, on }).await
    }

    pub async fn set_mute(&self, zone: u8, on: bool) -> AmpResult<()> {
        self.set(Command::SetMute { zone, on }).await
    }

    pub async fn set_volume(&self, zone: u8, level: u8) -> AmpResult<()> {
        self.set(Command::SetVolume { zone, level }).await
    }

    pub async fn set_source(&self, zone: u8, source: u8) -> AmpResult<()> {
        self.set(Command::SetSource { zone, source }).await
    }

    pub async fn set_treble(&self, zone: u8, level: u8) -> AmpResult<()> {
        self.set(Command::SetTreble { zone, level }).await
    }

    pub async fn set_bass(&self, zone: u8, level: u8) -> AmpResult<()> {
        self.set(Command::SetBass { zone, level }).await
    }

    pub async fn set_balance(&self, zone: u8, level: u8) -> AmpResult<()> {
        self.set(Command::SetBalance { zone, level }).await
    }

    pub async fn set_pa(&self, zone: u8, on: bool) -> AmpResult<()> {
        self.set(Command::SetPa { zone, on }).await
    }

    pub async fn set_dnd(&self, zone: u8, on: bool) -> AmpResult<()> {
        self.set(Command::SetDnd { zone, on }).await
    }

    /// Nine set-commands, see [`Monoprice::restore_zone`](super::Monoprice::restore_zone).
    pub async fn restore_zone(&self, status: &ZoneStatus) -> AmpResult<()> {
        into_ack(self.engine.execute(Command::RestoreZone(*status)).await?)
    }

    pub async fn close(&self) -> AmpResult<()> {
        self.engine.close().await
    }

    async fn set(&self, command: Command) -> AmpResult<()> {
        into_ack(self.engine.execute(command).await?)
    }
}
