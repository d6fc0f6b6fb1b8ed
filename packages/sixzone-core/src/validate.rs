//! Range checks applied to every command before it is encoded.
//!
//! The bound table here is the single source of truth: the codec uses
//! [`check`] on decoded fields, so a value accepted on the way out is
//! accepted on the way back in.

use crate::error::{AmpError, AmpResult};
use crate::protocol_constants::{MAX_UNITS, ZONES_PER_UNIT};
use crate::types::{Allowed, Command, Setting};

/// Returns the legal values of a setting.
#[must_use]
pub fn bounds(setting: Setting) -> Allowed {
    let (min, max) = match setting {
        Setting::Zone => return Allowed::ZoneIds,
        Setting::Unit => (1, MAX_UNITS),
        Setting::Volume => (0, 38),
        Setting::Treble | Setting::Bass => (0, 14),
        Setting::Balance => (0, 20),
        Setting::Source => (1, 4),
        Setting::Pa | Setting::Power | Setting::Mute | Setting::Dnd | Setting::Keypad => (0, 1),
    };
    Allowed::Range { min, max }
}

/// True for 11-16, 21-26 and 31-36.
#[must_use]
pub fn is_zone_id(id: u8) -> bool {
    let unit = id / 10;
    let position = id % 10;
    (1..=MAX_UNITS).contains(&unit) && (1..=ZONES_PER_UNIT).contains(&position)
}

/// Checks `value` against the bounds of `setting`.
///
/// Returns the allowed values on failure so callers can build either an
/// argument error (encode side) or a range error (decode side).
pub(crate) fn check(setting: Setting, value: u8) -> Result<u8, Allowed> {
    match bounds(setting) {
        Allowed::ZoneIds if is_zone_id(value) => Ok(value),
        Allowed::Range { min, max } if (min..=max).contains(&value) => Ok(value),
        allowed => Err(allowed),
    }
}

pub(crate) fn level(setting: Setting, value: u8) -> AmpResult<u8> {
    check(setting, value).map_err(|allowed| AmpError::InvalidArgument {
        setting,
        value,
        allowed,
    })
}

pub(crate) fn zone_id(id: u8) -> AmpResult<u8> {
    level(Setting::Zone, id)
}

pub(crate) fn unit_number(number: u8) -> AmpResult<u8> {
    level(Setting::Unit, number)
}

/// Validates a command, returning it unchanged.
///
/// The zone (or unit) is checked first, then the value; the first violation
/// is reported.
///
/// # Errors
/// Returns `InvalidArgument` naming the offending setting, value and range.
pub fn validate(command: Command) -> AmpResult<Command> {
    match &command {
        Command::SetPower { zone, .. }
        | Command::SetMute { zone, .. }
        | Command::SetPa { zone, .. }
        | Command::SetDnd { zone, .. }
        | Command::QueryStatus { zone } => {
            zone_id(*zone)?;
        }
        Command::SetVolume { zone, level: value } => {
            zone_id(*zone)?;
            level(Setting::Volume, *value)?;
        }
        Command::SetTreble { zone, level: value } => {
            zone_id(*zone)?;
            level(Setting::Treble, *value)?;
        }
        Command::SetBass { zone, level: value } => {
            zone_id(*zone)?;
            level(Setting::Bass, *value)?;
        }
        Command::SetBalance { zone, level: value } => {
            zone_id(*zone)?;
            level(Setting::Balance, *value)?;
        }
        Command::SetSource { zone, source } => {
            zone_id(*zone)?;
            level(Setting::Source, *source)?;
        }
        Command::QueryUnit { unit } => {
            unit_number(*unit)?;
        }
        Command::RestoreZone(status) => {
            for step in status.restore_commands() {
                validate(step)?;
            }
        }
    }
    Ok(command)
}
