//! Sixzone - command-line control for six-zone whole-home amplifiers.
//!
//! Each invocation opens the serial port, runs one operation and exits.
//! Status output is YAML, and `restore` accepts the same YAML back, so a
//! zone can be snapshotted with `sixzone status 11 > zone11.yaml` and put
//! back later with `sixzone restore zone11.yaml`.

mod config;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sixzone_core::{render_status, AmpError, ErrorCode, MonopriceAsync, ZoneStatus};

use crate::config::CliConfig;

/// Sixzone - control a six-zone amplifier over RS-232.
#[derive(Parser, Debug)]
#[command(name = "sixzone")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "warn", env = "SIXZONE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Serial device (overrides config file).
    #[arg(short, long, env = "SIXZONE_PORT")]
    port: Option<String>,

    /// Baud rate (overrides config file).
    #[arg(short, long, env = "SIXZONE_BAUD_RATE")]
    baud_rate: Option<u32>,

    /// Reply timeout in milliseconds (overrides config file).
    #[arg(short, long, env = "SIXZONE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the status of one zone.
    Status {
        zone: u8,
        /// Print the device's status line instead of YAML.
        #[arg(long)]
        raw: bool,
    },
    /// Print the status of every zone on a unit (1-3).
    Unit { unit: u8 },
    /// Turn a zone on or off.
    Power { zone: u8, state: Switch },
    /// Mute or unmute a zone.
    Mute { zone: u8, state: Switch },
    /// Set volume (0-38).
    Volume { zone: u8, level: u8 },
    /// Select source input (1-4).
    Source { zone: u8, source: u8 },
    /// Set treble (0-14, 7 is flat).
    Treble { zone: u8, level: u8 },
    /// Set bass (0-14, 7 is flat).
    Bass { zone: u8, level: u8 },
    /// Set balance (0-20, 10 is centre).
    Balance { zone: u8, level: u8 },
    /// Public-address mode.
    Pa { zone: u8, state: Switch },
    /// Do-not-disturb mode.
    Dnd { zone: u8, state: Switch },
    /// Restore a zone from a YAML status snapshot.
    Restore { file: PathBuf },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        matches!(switch, Switch::On)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::debug!("Sixzone v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(rate) = args.baud_rate {
        config.baud_rate = rate;
    }
    if let Some(ms) = args.timeout_ms {
        config.timeout_ms = ms;
    }

    let port = config.port.clone().context(
        "No serial port configured. \
         Please specify --port or set SIXZONE_PORT to the amplifier's serial device.",
    )?;

    log::info!(
        "Configuration: port={}, baud_rate={}, timeout_ms={}",
        port,
        config.baud_rate,
        config.timeout_ms
    );

    let amp = MonopriceAsync::open(&port, config.to_client_config())
        .await
        .map_err(|e| report(e, "open"))
        .with_context(|| format!("Failed to open amplifier on {port}"))?;

    let result = run(&amp, args.command).await;

    if let Err(e) = amp.close().await {
        log::warn!("Failed to close {}: {}", port, e);
    }
    result
}

async fn run(amp: &MonopriceAsync, command: Cmd) -> Result<()> {
    match command {
        Cmd::Status { zone, raw } => {
            let status = amp.zone_status(zone).await.map_err(|e| report(e, "status"))?;
            if raw {
                println!("{}", render_status(&status));
            } else {
                print!("{}", serde_yaml::to_string(&status)?);
            }
        }
        Cmd::Unit { unit } => {
            let zones = amp
                .all_zone_status(unit)
                .await
                .map_err(|e| report(e, "unit"))?;
            print!("{}", serde_yaml::to_string(&zones)?);
        }
        Cmd::Power { zone, state } => {
            amp.set_power(zone, state.into()).await.map_err(|e| report(e, "power"))?
        }
        Cmd::Mute { zone, state } => {
            amp.set_mute(zone, state.into()).await.map_err(|e| report(e, "mute"))?
        }
        Cmd::Volume { zone, level } => {
            amp.set_volume(zone, level).await.map_err(|e| report(e, "volume"))?
        }
        Cmd::Source { zone, source } => {
            amp.set_source(zone, source).await.map_err(|e| report(e, "source"))?
        }
        Cmd::Treble { zone, level } => {
            amp.set_treble(zone, level).await.map_err(|e| report(e, "treble"))?
        }
        Cmd::Bass { zone, level } => {
            amp.set_bass(zone, level).await.map_err(|e| report(e, "bass"))?
        }
        Cmd::Balance { zone, level } => {
            amp.set_balance(zone, level).await.map_err(|e| report(e, "balance"))?
        }
        Cmd::Pa { zone, state } => {
            amp.set_pa(zone, state.into()).await.map_err(|e| report(e, "pa"))?
        }
        Cmd::Dnd { zone, state } => {
            amp.set_dnd(zone, state.into()).await.map_err(|e| report(e, "dnd"))?
        }
        Cmd::Restore { file } => {
            let status = load_snapshot(&file)?;
            log::info!("Restoring zone {} from {}", status.zone(), file.display());
            amp.restore_zone(&status).await.map_err(|e| report(e, "restore"))?;
        }
    }
    Ok(())
}

/// Reads a zone snapshot written by `sixzone status`.
fn load_snapshot(path: &std::path::Path) -> Result<ZoneStatus> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid snapshot: {}", path.display()))
}

/// Tags an amplifier error with its machine-readable code.
fn report(err: AmpError, op: &str) -> anyhow::Error {
    if err.is_transport_fatal() {
        log::error!("[{}] {} (port unusable)", err.code(), err);
    }
    let code = err.code();
    anyhow!(err).context(format!("{op} failed ({code})"))
}
