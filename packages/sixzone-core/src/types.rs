//! Domain types for amplifier zones, commands and replies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AmpResult;
use crate::protocol_constants::{MAX_UNITS, ZONES_PER_UNIT};
use crate::validate;

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// A named field of the zone state, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    Zone,
    Unit,
    Pa,
    Power,
    Mute,
    Dnd,
    Volume,
    Treble,
    Bass,
    Balance,
    Source,
    Keypad,
}

impl Setting {
    /// Two-letter protocol mnemonic used in set commands.
    ///
    /// `Zone` and `Unit` have no mnemonic of their own and report their name.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Zone => "zone",
            Self::Unit => "unit",
            Self::Pa => "PA",
            Self::Power => "PR",
            Self::Mute => "MU",
            Self::Dnd => "DT",
            Self::Volume => "VO",
            Self::Treble => "TR",
            Self::Bass => "BS",
            Self::Balance => "BL",
            Self::Source => "CH",
            Self::Keypad => "LS",
        }
    }

    /// Human-readable field name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Zone => "zone",
            Self::Unit => "unit",
            Self::Pa => "public announcement",
            Self::Power => "power",
            Self::Mute => "mute",
            Self::Dnd => "do not disturb",
            Self::Volume => "volume",
            Self::Treble => "treble",
            Self::Bass => "bass",
            Self::Balance => "balance",
            Self::Source => "source",
            Self::Keypad => "keypad",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values a setting accepts, reported in range errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Allowed {
    /// Inclusive numeric range.
    Range { min: u8, max: u8 },
    /// One of the enumerated zone ids.
    ZoneIds,
}

impl fmt::Display for Allowed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { min, max } => write!(f, "{min}..={max}"),
            Self::ZoneIds => f.write_str("11-16, 21-26 or 31-36"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Zone / Unit
// ─────────────────────────────────────────────────────────────────────────────

/// A validated zone id: `<unit 1-3><zone 1-6>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Zone(u8);

impl Zone {
    /// Validates a raw zone id.
    ///
    /// # Errors
    /// Returns `InvalidArgument` unless `id` is 11-16, 21-26 or 31-36.
    pub fn new(id: u8) -> AmpResult<Self> {
        validate::zone_id(id).map(Self)
    }

    /// Raw two-digit id.
    #[must_use]
    pub fn id(self) -> u8 {
        self.0
    }

    /// The amplifier unit this zone belongs to.
    #[must_use]
    pub fn unit(self) -> Unit {
        Unit(self.0 / 10)
    }

    /// Position of the zone on its unit (1-6).
    #[must_use]
    pub fn position(self) -> u8 {
        self.0 % 10
    }

    /// Every legal zone, in ascending order.
    pub fn all() -> impl Iterator<Item = Zone> {
        (1..=MAX_UNITS).flat_map(|unit| Unit(unit).zones())
    }
}

impl TryFrom<u8> for Zone {
    type Error = crate::error::AmpError;

    fn try_from(id: u8) -> AmpResult<Self> {
        Self::new(id)
    }
}

impl From<Zone> for u8 {
    fn from(zone: Zone) -> u8 {
        zone.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// A validated amplifier unit number (1-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Unit(u8);

impl Unit {
    /// Validates a raw unit number.
    ///
    /// # Errors
    /// Returns `InvalidArgument` unless `number` is 1-3.
    pub fn new(number: u8) -> AmpResult<Self> {
        validate::unit_number(number).map(Self)
    }

    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }

    /// Id the unit is addressed by in a whole-unit query (10, 20 or 30).
    #[must_use]
    pub fn wire_id(self) -> u8 {
        self.0 * 10
    }

    /// The six zones of this unit.
    pub fn zones(self) -> impl Iterator<Item = Zone> {
        let base = self.wire_id();
        (1..=ZONES_PER_UNIT).map(move |position| Zone(base + position))
    }
}

impl TryFrom<u8> for Unit {
    type Error = crate::error::AmpError;

    fn try_from(number: u8) -> AmpResult<Self> {
        Self::new(number)
    }
}

impl From<Unit> for u8 {
    fn from(unit: Unit) -> u8 {
        unit.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Zone Status
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of one zone, as reported by the amplifier.
///
/// Every field is within its protocol range: values come either from the
/// decoder, which rejects out-of-range fields, or from
/// [`ZoneStatusBuilder::build`], which applies the same checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ZoneStatusBuilder")]
pub struct ZoneStatus {
    zone: Zone,
    pa: bool,
    power: bool,
    mute: bool,
    do_not_disturb: bool,
    volume: u8,
    treble: u8,
    bass: u8,
    balance: u8,
    source: u8,
    keypad: bool,
}

impl ZoneStatus {
    /// Starts building a status for `zone` (used to prepare a restore).
    #[must_use]
    pub fn builder(zone: u8) -> ZoneStatusBuilder {
        ZoneStatusBuilder::new(zone)
    }

    #[must_use]
    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Public-announcement mode active.
    #[must_use]
    pub fn pa(&self) -> bool {
        self.pa
    }

    #[must_use]
    pub fn power(&self) -> bool {
        self.power
    }

    #[must_use]
    pub fn mute(&self) -> bool {
        self.mute
    }

    #[must_use]
    pub fn do_not_disturb(&self) -> bool {
        self.do_not_disturb
    }

    /// Volume 0-38.
    #[must_use]
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Treble 0-14, where 7 is flat.
    #[must_use]
    pub fn treble(&self) -> u8 {
        self.treble
    }

    /// Bass 0-14, where 7 is flat.
    #[must_use]
    pub fn bass(&self) -> u8 {
        self.bass
    }

    /// Balance 0-20: 0 is full left, 10 centre, 20 full right.
    #[must_use]
    pub fn balance(&self) -> u8 {
        self.balance
    }

    /// Selected source 1-4.
    #[must_use]
    pub fn source(&self) -> u8 {
        self.source
    }

    /// A wall keypad is connected to the zone.
    #[must_use]
    pub fn keypad(&self) -> bool {
        self.keypad
    }

    /// Treble as a signed offset, -7..=+7.
    #[must_use]
    pub fn treble_offset(&self) -> i8 {
        self.treble as i8 - 7
    }

    /// Bass as a signed offset, -7..=+7.
    #[must_use]
    pub fn bass_offset(&self) -> i8 {
        self.bass as i8 - 7
    }

    /// Balance as a signed offset, -10 (left) ..= +10 (right).
    #[must_use]
    pub fn balance_offset(&self) -> i8 {
        self.balance as i8 - 10
    }

    /// The set-commands that bring a zone back to this state, in the order
    /// they are issued by a restore.
    #[must_use]
    pub fn restore_commands(&self) -> [Command; 9] {
        let zone = self.zone.id();
        [
            Command::SetPower { zone, on: self.power },
            Command::SetMute { zone, on: self.mute },
            Command::SetVolume { zone, level: self.volume },
            Command::SetTreble { zone, level: self.treble },
            Command::SetBass { zone, level: self.bass },
            Command::SetBalance { zone, level: self.balance },
            Command::SetSource { zone, source: self.source },
            Command::SetPa { zone, on: self.pa },
            Command::SetDnd { zone, on: self.do_not_disturb },
        ]
    }
}

/// Unvalidated zone fields; [`build`](Self::build) checks every range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStatusBuilder {
    pub zone: u8,
    #[serde(default)]
    pub pa: bool,
    #[serde(default)]
    pub power: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub do_not_disturb: bool,
    #[serde(default)]
    pub volume: u8,
    #[serde(default = "flat_tone")]
    pub treble: u8,
    #[serde(default = "flat_tone")]
    pub bass: u8,
    #[serde(default = "centre_balance")]
    pub balance: u8,
    #[serde(default = "first_source")]
    pub source: u8,
    #[serde(default)]
    pub keypad: bool,
}

fn flat_tone() -> u8 {
    7
}

fn centre_balance() -> u8 {
    10
}

fn first_source() -> u8 {
    1
}

impl ZoneStatusBuilder {
    /// Powered off, muted off, volume 0, flat tone, centred, source 1.
    #[must_use]
    pub fn new(zone: u8) -> Self {
        Self {
            zone,
            pa: false,
            power: false,
            mute: false,
            do_not_disturb: false,
            volume: 0,
            treble: flat_tone(),
            bass: flat_tone(),
            balance: centre_balance(),
            source: first_source(),
            keypad: false,
        }
    }

    #[must_use]
    pub fn pa(mut self, on: bool) -> Self {
        self.pa = on;
        self
    }

    #[must_use]
    pub fn power(mut self, on: bool) -> Self {
        self.power = on;
        self
    }

    #[must_use]
    pub fn mute(mut self, on: bool) -> Self {
        self.mute = on;
        self
    }

    #[must_use]
    pub fn do_not_disturb(mut self, on: bool) -> Self {
        self.do_not_disturb = on;
        self
    }

    #[must_use]
    pub fn volume(mut self, level: u8) -> Self {
        self.volume = level;
        self
    }

    #[must_use]
    pub fn treble(mut self, level: u8) -> Self {
        self.treble = level;
        self
    }

    #[must_use]
    pub fn bass(mut self, level: u8) -> Self {
        self.bass = level;
        self
    }

    #[must_use]
    pub fn balance(mut self, level: u8) -> Self {
        self.balance = level;
        self
    }

    #[must_use]
    pub fn source(mut self, source: u8) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn keypad(mut self, connected: bool) -> Self {
        self.keypad = connected;
        self
    }

    /// Validates every field and produces the status.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for the first field outside its range.
    pub fn build(self) -> AmpResult<ZoneStatus> {
        Ok(ZoneStatus {
            zone: Zone::new(self.zone)?,
            pa: self.pa,
            power: self.power,
            mute: self.mute,
            do_not_disturb: self.do_not_disturb,
            volume: validate::level(Setting::Volume, self.volume)?,
            treble: validate::level(Setting::Treble, self.treble)?,
            bass: validate::level(Setting::Bass, self.bass)?,
            balance: validate::level(Setting::Balance, self.balance)?,
            source: validate::level(Setting::Source, self.source)?,
            keypad: self.keypad,
        })
    }
}

impl TryFrom<ZoneStatusBuilder> for ZoneStatus {
    type Error = crate::error::AmpError;

    fn try_from(builder: ZoneStatusBuilder) -> AmpResult<Self> {
        builder.build()
    }
}

/// Assembles a status from fields that the decoder has already range-checked.
pub(crate) struct DecodedFields {
    pub zone: Zone,
    pub pa: bool,
    pub power: bool,
    pub mute: bool,
    pub do_not_disturb: bool,
    pub volume: u8,
    pub treble: u8,
    pub bass: u8,
    pub balance: u8,
    pub source: u8,
    pub keypad: bool,
}

impl From<DecodedFields> for ZoneStatus {
    fn from(f: DecodedFields) -> Self {
        Self {
            zone: f.zone,
            pa: f.pa,
            power: f.power,
            mute: f.mute,
            do_not_disturb: f.do_not_disturb,
            volume: f.volume,
            treble: f.treble,
            bass: f.bass,
            balance: f.balance,
            source: f.source,
            keypad: f.keypad,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// A request to the amplifier. Values are raw and validated before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetPower { zone: u8, on: bool },
    SetMute { zone: u8, on: bool },
    SetVolume { zone: u8, level: u8 },
    SetSource { zone: u8, source: u8 },
    SetTreble { zone: u8, level: u8 },
    SetBass { zone: u8, level: u8 },
    SetBalance { zone: u8, level: u8 },
    SetPa { zone: u8, on: bool },
    SetDnd { zone: u8, on: bool },
    QueryStatus { zone: u8 },
    QueryUnit { unit: u8 },
    RestoreZone(ZoneStatus),
}

impl Command {
    /// The setting a set-command changes, `None` for queries and restores.
    #[must_use]
    pub fn setting(&self) -> Option<Setting> {
        match self {
            Self::SetPower { .. } => Some(Setting::Power),
            Self::SetMute { .. } => Some(Setting::Mute),
            Self::SetVolume { .. } => Some(Setting::Volume),
            Self::SetSource { .. } => Some(Setting::Source),
            Self::SetTreble { .. } => Some(Setting::Treble),
            Self::SetBass { .. } => Some(Setting::Bass),
            Self::SetBalance { .. } => Some(Setting::Balance),
            Self::SetPa { .. } => Some(Setting::Pa),
            Self::SetDnd { .. } => Some(Setting::Dnd),
            Self::QueryStatus { .. } | Self::QueryUnit { .. } | Self::RestoreZone(_) => None,
        }
    }

    /// Splits the command into single-frame commands.
    ///
    /// Every command is one frame except `RestoreZone`, which becomes one
    /// set-command per restorable setting.
    #[must_use]
    pub fn steps(&self) -> Vec<Command> {
        match self {
            Self::RestoreZone(status) => status.restore_commands().to_vec(),
            other => vec![other.clone()],
        }
    }

    /// How many reply lines the device sends for this command, and what
    /// they must contain. `None` for `RestoreZone`, which has no single reply.
    #[must_use]
    pub fn reply_policy(&self) -> Option<ReplyPolicy> {
        match self {
            Self::QueryStatus { zone } => Some(ReplyPolicy::Status { zone: *zone }),
            Self::QueryUnit { unit } => Some(ReplyPolicy::Unit { unit: *unit }),
            Self::RestoreZone(_) => None,
            _ => Some(ReplyPolicy::Ack),
        }
    }
}

/// What a single-frame command expects back from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyPolicy {
    /// Echo and prompt only; a status line here is a protocol violation.
    Ack,
    /// Echo, then the status line of `zone`.
    Status { zone: u8 },
    /// Echo, then one status line for each zone of `unit`.
    Unit { unit: u8 },
}

impl ReplyPolicy {
    /// Number of terminated lines to read.
    #[must_use]
    pub fn lines(self) -> usize {
        use crate::protocol_constants::{ACK_LINES, UNIT_QUERY_LINES, ZONE_QUERY_LINES};
        match self {
            Self::Ack => ACK_LINES,
            Self::Status { .. } => ZONE_QUERY_LINES,
            Self::Unit { .. } => UNIT_QUERY_LINES,
        }
    }
}

/// Decoded outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The device acknowledged a set-command.
    Ack,
    /// Status of one zone.
    Status(ZoneStatus),
    /// Status of every zone on a unit, in zone order.
    Unit(Vec<ZoneStatus>),
}
