//! Wire codec for the amplifier's ASCII control protocol.
//!
//! Pure functions only: commands are rendered to request frames, and status
//! lines are parsed by fixed offsets into [`ZoneStatus`]. Set-command frames
//! and status lines are different framings and are handled separately.
//!
//! ```text
//! set:     <13VO15\r                zone 13, volume 15
//! query:   ?13\r                    status of zone 13
//! status:  >1300010000151112100301  zone PA PR MU DT VO TR BS BL CH LS
//! ```

use std::fmt::Write as _;

use crate::error::{AmpError, AmpResult, MalformedResponse};
use crate::protocol_constants::{
    FIELD_WIDTH, QUERY_PREFIX, REQUEST_TERMINATOR, SET_PREFIX, STATUS_FIELD_COUNT,
    STATUS_LINE_LEN, STATUS_MARKER, ZONES_PER_UNIT,
};
use crate::types::{Command, DecodedFields, Setting, Unit, ZoneStatus};
use crate::validate;

/// Field order of a status line, after the `>` marker.
const STATUS_FIELDS: [Setting; STATUS_FIELD_COUNT] = [
    Setting::Zone,
    Setting::Pa,
    Setting::Power,
    Setting::Mute,
    Setting::Dnd,
    Setting::Volume,
    Setting::Treble,
    Setting::Bass,
    Setting::Balance,
    Setting::Source,
    Setting::Keypad,
];

// ─────────────────────────────────────────────────────────────────────────────
// Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Renders a command as request bytes, terminator included.
///
/// `RestoreZone` renders as the frames of its steps, back to back. The
/// command must already have passed [`validate`](crate::validate::validate).
#[must_use]
pub fn encode(command: &Command) -> Vec<u8> {
    match command {
        Command::SetPower { zone, on } => set_frame(*zone, Setting::Power, u8::from(*on)),
        Command::SetMute { zone, on } => set_frame(*zone, Setting::Mute, u8::from(*on)),
        Command::SetPa { zone, on } => set_frame(*zone, Setting::Pa, u8::from(*on)),
        Command::SetDnd { zone, on } => set_frame(*zone, Setting::Dnd, u8::from(*on)),
        Command::SetVolume { zone, level } => set_frame(*zone, Setting::Volume, *level),
        Command::SetTreble { zone, level } => set_frame(*zone, Setting::Treble, *level),
        Command::SetBass { zone, level } => set_frame(*zone, Setting::Bass, *level),
        Command::SetBalance { zone, level } => set_frame(*zone, Setting::Balance, *level),
        Command::SetSource { zone, source } => set_frame(*zone, Setting::Source, *source),
        Command::QueryStatus { zone } => query_frame(*zone),
        Command::QueryUnit { unit } => query_frame(unit * 10),
        Command::RestoreZone(status) => status
            .restore_commands()
            .iter()
            .flat_map(encode)
            .collect(),
    }
}

fn set_frame(zone: u8, setting: Setting, value: u8) -> Vec<u8> {
    let mut frame = format!(
        "{}{zone:02}{}{value:02}",
        SET_PREFIX as char,
        setting.mnemonic()
    )
    .into_bytes();
    frame.push(REQUEST_TERMINATOR);
    frame
}

fn query_frame(id: u8) -> Vec<u8> {
    let mut frame = format!("{}{id:02}", QUERY_PREFIX as char).into_bytes();
    frame.push(REQUEST_TERMINATOR);
    frame
}

/// Renders a status in the device's status-line framing, without terminator.
#[must_use]
pub fn render_status(status: &ZoneStatus) -> String {
    let values = [
        status.zone().id(),
        u8::from(status.pa()),
        u8::from(status.power()),
        u8::from(status.mute()),
        u8::from(status.do_not_disturb()),
        status.volume(),
        status.treble(),
        status.bass(),
        status.balance(),
        status.source(),
        u8::from(status.keypad()),
    ];
    let mut line = String::with_capacity(STATUS_LINE_LEN);
    line.push(STATUS_MARKER as char);
    for value in values {
        let _ = write!(line, "{value:02}");
    }
    line
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Strips surrounding ASCII whitespace (the device pads lines with CR/LF).
pub(crate) fn trim(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

/// True if the line is shaped like a status line (starts with `>`).
pub(crate) fn is_status_line(line: &[u8]) -> bool {
    trim(line).first() == Some(&STATUS_MARKER)
}

/// Parses one status line.
///
/// # Errors
/// - `MalformedResponse` if the line is not exactly the fixed width, the
///   marker is wrong, or a field is not two digits.
/// - `OutOfRange` if a field is outside its protocol range.
pub fn decode(line: &[u8]) -> AmpResult<ZoneStatus> {
    let line = trim(line);

    if line.len() < STATUS_LINE_LEN {
        return Err(MalformedResponse::TooShort {
            len: line.len(),
            expected: STATUS_LINE_LEN,
        }
        .into());
    }
    if line.len() > STATUS_LINE_LEN {
        return Err(MalformedResponse::TrailingBytes {
            len: line.len(),
            expected: STATUS_LINE_LEN,
        }
        .into());
    }
    if line[0] != STATUS_MARKER {
        return Err(MalformedResponse::BadMarker {
            found: line[0] as char,
        }
        .into());
    }

    let mut values = [0u8; STATUS_FIELD_COUNT];
    for (index, setting) in STATUS_FIELDS.iter().enumerate() {
        values[index] = field(line, index, *setting)?;
    }
    let [zone, pa, power, mute, dnd, volume, treble, bass, balance, source, keypad] = values;

    Ok(ZoneStatus::from(DecodedFields {
        zone: crate::types::Zone::new(zone).map_err(|_| out_of_range(Setting::Zone, zone))?,
        pa: pa == 1,
        power: power == 1,
        mute: mute == 1,
        do_not_disturb: dnd == 1,
        volume,
        treble,
        bass,
        balance,
        source,
        keypad: keypad == 1,
    }))
}

/// Reads and range-checks the `index`th two-digit field.
fn field(line: &[u8], index: usize, setting: Setting) -> AmpResult<u8> {
    let offset = 1 + index * FIELD_WIDTH;
    let digits = &line[offset..offset + FIELD_WIDTH];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(MalformedResponse::NonDigit { setting, offset }.into());
    }
    let value = digits.iter().fold(0u8, |acc, d| acc * 10 + (d - b'0'));
    validate::check(setting, value).map_err(|_| out_of_range(setting, value))
}

fn out_of_range(setting: Setting, value: u8) -> AmpError {
    AmpError::OutOfRange {
        setting,
        value,
        allowed: validate::bounds(setting),
    }
}

/// Parses the six status lines of a unit query, in zone order.
///
/// # Errors
/// Fails with `IncompleteUnit` unless there is one line per zone, on the
/// first line that does not decode, and with `ZoneMismatch`
/// when a line describes a zone other than the next zone of `unit`.
pub fn decode_unit<L: AsRef<[u8]>>(unit: Unit, lines: &[L]) -> AmpResult<Vec<ZoneStatus>> {
    let expected = usize::from(ZONES_PER_UNIT);
    if lines.len() != expected {
        return Err(MalformedResponse::IncompleteUnit {
            found: lines.len(),
            expected,
        }
        .into());
    }
    let mut statuses = Vec::with_capacity(lines.len());
    for (expected, line) in unit.zones().zip(lines) {
        let status = decode(line.as_ref())?;
        if status.zone() != expected {
            return Err(MalformedResponse::ZoneMismatch {
                expected: expected.id(),
                found: status.zone().id(),
            }
            .into());
        }
        statuses.push(status);
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Zone;

    fn sample(zone: u8) -> ZoneStatus {
        ZoneStatus::builder(zone)
            .power(true)
            .volume(15)
            .treble(11)
            .bass(12)
            .balance(10)
            .source(3)
            .keypad(true)
            .build()
            .unwrap()
    }

    #[test]
    fn encodes_set_volume_for_zone_13() {
        let frame = encode(&Command::SetVolume { zone: 13, level: 15 });
        assert_eq!(frame, b"<13VO15\r");
    }

    #[test]
    fn encodes_every_set_mnemonic() {
        let cases: [(Command, &[u8]); 9] = [
            (Command::SetPower { zone: 11, on: true }, b"<11PR01\r"),
            (Command::SetMute { zone: 11, on: false }, b"<11MU00\r"),
            (Command::SetPa { zone: 21, on: true }, b"<21PA01\r"),
            (Command::SetDnd { zone: 36, on: true }, b"<36DT01\r"),
            (Command::SetVolume { zone: 12, level: 0 }, b"<12VO00\r"),
            (Command::SetTreble { zone: 12, level: 14 }, b"<12TR14\r"),
            (Command::SetBass { zone: 12, level: 7 }, b"<12BS07\r"),
            (Command::SetBalance { zone: 12, level: 20 }, b"<12BL20\r"),
            (Command::SetSource { zone: 12, source: 4 }, b"<12CH04\r"),
        ];
        for (command, expected) in cases {
            assert_eq!(encode(&command), expected, "{command:?}");
        }
    }

    #[test]
    fn encodes_queries() {
        assert_eq!(encode(&Command::QueryStatus { zone: 24 }), b"?24\r");
        assert_eq!(encode(&Command::QueryUnit { unit: 2 }), b"?20\r");
    }

    #[test]
    fn restore_encodes_all_steps_in_order() {
        let frame = encode(&Command::RestoreZone(sample(11)));
        assert_eq!(
            frame,
            b"<11PR01\r<11MU00\r<11VO15\r<11TR11\r<11BS12\r<11BL10\r<11CH03\r<11PA00\r<11DT00\r"
        );
    }

    #[test]
    fn decodes_device_reply_for_zone_13() {
        let status = decode(b">1300010000151112100301").unwrap();
        assert_eq!(status.zone().id(), 13);
        assert!(!status.pa());
        assert!(status.power());
        assert!(!status.mute());
        assert!(!status.do_not_disturb());
        assert_eq!(status.volume(), 15);
        assert_eq!(status.treble(), 11);
        assert_eq!(status.bass(), 12);
        assert_eq!(status.balance(), 10);
        assert_eq!(status.source(), 3);
        assert!(status.keypad());
        assert_eq!(status, sample(13));
    }

    #[test]
    fn decode_tolerates_surrounding_whitespace() {
        let status = decode(b"\r\n>1300010000151112100301\r\n").unwrap();
        assert_eq!(status.zone().id(), 13);
    }

    #[test]
    fn render_then_decode_round_trips_for_every_zone() {
        for zone in Zone::all() {
            for power in [false, true] {
                let status = ZoneStatus::builder(zone.id())
                    .power(power)
                    .mute(!power)
                    .volume(38)
                    .balance(0)
                    .source(4)
                    .build()
                    .unwrap();
                let line = render_status(&status);
                assert_eq!(line.len(), STATUS_LINE_LEN);
                assert_eq!(decode(line.as_bytes()).unwrap(), status);
            }
        }
    }

    #[test]
    fn short_line_is_malformed() {
        let err = decode(b">130001000015111210030").unwrap_err();
        assert!(matches!(
            err,
            AmpError::MalformedResponse(MalformedResponse::TooShort { len: 22, expected: 23 })
        ));
        assert!(matches!(
            decode(b">").unwrap_err(),
            AmpError::MalformedResponse(MalformedResponse::TooShort { .. })
        ));
    }

    #[test]
    fn long_line_is_malformed() {
        assert!(matches!(
            decode(b">13000100001511121003011").unwrap_err(),
            AmpError::MalformedResponse(MalformedResponse::TrailingBytes { .. })
        ));
    }

    #[test]
    fn non_digit_field_is_malformed() {
        let err = decode(b">13000100001511x2100301").unwrap_err();
        assert!(matches!(
            err,
            AmpError::MalformedResponse(MalformedResponse::NonDigit {
                setting: Setting::Bass,
                offset: 15,
            })
        ));
    }

    #[test]
    fn wrong_marker_is_malformed() {
        assert!(matches!(
            decode(b"#1300010000151112100301").unwrap_err(),
            AmpError::MalformedResponse(MalformedResponse::BadMarker { found: '#' })
        ));
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let cases: [(&[u8], Setting, u8); 5] = [
            (b">1300010000391112100301", Setting::Volume, 39),
            (b">1300010000151112210301", Setting::Balance, 21),
            (b">1300010000151112100501", Setting::Source, 5),
            (b">1302010000151112100301", Setting::Pa, 2),
            (b">0100010000151112100301", Setting::Zone, 1),
        ];
        for (line, expected_setting, expected_value) in cases {
            match decode(line) {
                Err(AmpError::OutOfRange { setting, value, .. }) => {
                    assert_eq!((setting, value), (expected_setting, expected_value));
                }
                other => panic!("expected OutOfRange for {expected_setting}, got {other:?}"),
            }
        }
    }

    #[test]
    fn decodes_unit_in_zone_order() {
        let unit = Unit::new(2).unwrap();
        let lines: Vec<String> = unit.zones().map(|z| render_status(&sample(z.id()))).collect();
        let statuses = decode_unit(unit, &lines).unwrap();
        let zones: Vec<u8> = statuses.iter().map(|s| s.zone().id()).collect();
        assert_eq!(zones, vec![21, 22, 23, 24, 25, 26]);
    }

    #[test]
    fn unit_decode_requires_six_lines() {
        let unit = Unit::new(1).unwrap();
        let lines = [render_status(&sample(11))];
        assert!(matches!(
            decode_unit(unit, &lines).unwrap_err(),
            AmpError::MalformedResponse(MalformedResponse::IncompleteUnit {
                found: 1,
                expected: 6,
            })
        ));
    }

    #[test]
    fn unit_decode_rejects_foreign_zone() {
        let unit = Unit::new(1).unwrap();
        let mut lines: Vec<String> = unit.zones().map(|z| render_status(&sample(z.id()))).collect();
        lines[1] = render_status(&sample(21));
        assert!(matches!(
            decode_unit(unit, &lines).unwrap_err(),
            AmpError::MalformedResponse(MalformedResponse::ZoneMismatch {
                expected: 12,
                found: 21,
            })
        ));
    }
}
