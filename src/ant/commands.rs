/// Time synchronization and session control commands sent to the sensor
use log::warn;
use time::macros::datetime;
use time::{OffsetDateTime, UtcOffset};

use crate::ant::profile::{Payload, PAGE_TIME_COMMAND};

/// ANT+ epoch: 1989-12-31 00:00:00 UTC
const ANT_EPOCH: OffsetDateTime = datetime!(1989-12-31 0:00 UTC);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimeCommand {
    SetUtcTime = 0x00,
    StartSession = 0x01,
    StopSession = 0x02,
    SetLap = 0x03,
}

impl TimeCommand {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Build a time command payload for the given instant
///
/// Layout: `[0x10, command, 0xFF, offset, utc0, utc1, utc2, utc3]` where
/// `offset` is the local UTC offset in quarter hours (signed byte) and
/// `utc` the whole seconds since the ANT+ epoch, little-endian.
pub fn build_time_command_at(command: TimeCommand, now: OffsetDateTime) -> Payload {
    let utc_seconds = (now - ANT_EPOCH).whole_seconds() as u32;
    let offset = quarter_hours(now.offset());
    let utc = utc_seconds.to_le_bytes();

    [
        PAGE_TIME_COMMAND,
        command.code(),
        0xFF,
        offset as u8,
        utc[0],
        utc[1],
        utc[2],
        utc[3],
    ]
}

/// Build a time command payload stamped with the current local time
pub fn build_time_command(command: TimeCommand) -> Payload {
    build_time_command_at(command, local_now())
}

/// Build a time command payload for the current instant in a known offset
///
/// The local offset can only be looked up reliably while the process is single
/// threaded, so long-running callers resolve it once at startup.
pub fn build_time_command_in(command: TimeCommand, offset: UtcOffset) -> Payload {
    build_time_command_at(command, OffsetDateTime::now_utc().to_offset(offset))
}

fn quarter_hours(offset: UtcOffset) -> i8 {
    (f64::from(offset.whole_minutes()) / 15.0).round() as i8
}

/// Current time in the local offset, falling back to UTC when it can't be determined
fn local_now() -> OffsetDateTime {
    match OffsetDateTime::now_local() {
        Ok(now) => now,
        Err(e) => {
            warn!("Local UTC offset unavailable, using UTC: {}", e);
            OffsetDateTime::now_utc()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::offset;

    #[test]
    fn epoch_encodes_as_zero_seconds() {
        let payload = build_time_command_at(TimeCommand::SetUtcTime, ANT_EPOCH);
        assert_eq!(payload, [0x10, 0x00, 0xFF, 0x00, 0, 0, 0, 0]);
    }

    #[test]
    fn utc_seconds_are_little_endian() {
        // 2024-01-01 00:00:00 UTC is 1_073_001_600 seconds after the ANT+ epoch
        let now = datetime!(2024-01-01 0:00 UTC);
        let payload = build_time_command_at(TimeCommand::StartSession, now);

        assert_eq!(payload[0], 0x10);
        assert_eq!(payload[1], 0x01);
        assert_eq!(payload[2], 0xFF);
        assert_eq!(
            u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]),
            1_073_001_600
        );
    }

    #[test]
    fn sub_second_part_is_truncated() {
        let whole = datetime!(2024-01-01 12:00:00 UTC);
        let later = datetime!(2024-01-01 12:00:00.999 UTC);
        assert_eq!(
            build_time_command_at(TimeCommand::SetUtcTime, whole),
            build_time_command_at(TimeCommand::SetUtcTime, later)
        );
    }

    #[test]
    fn offset_is_in_quarter_hours() {
        let east = datetime!(2024-06-01 12:00 UTC).to_offset(offset!(+2));
        assert_eq!(build_time_command_at(TimeCommand::SetUtcTime, east)[3], 8);

        let india = datetime!(2024-06-01 12:00 UTC).to_offset(offset!(+5:30));
        assert_eq!(build_time_command_at(TimeCommand::SetUtcTime, india)[3], 22);

        let west = datetime!(2024-06-01 12:00 UTC).to_offset(offset!(-5));
        assert_eq!(build_time_command_at(TimeCommand::SetUtcTime, west)[3], (-20i8) as u8);
    }

    #[test]
    fn offset_does_not_change_utc_seconds() {
        let utc = datetime!(2024-06-01 12:00 UTC);
        let local = utc.to_offset(offset!(-5));
        let a = build_time_command_at(TimeCommand::SetLap, utc);
        let b = build_time_command_at(TimeCommand::SetLap, local);
        assert_eq!(a[4..], b[4..]);
    }

    #[test]
    fn commands_differ_only_in_command_byte() {
        let now = datetime!(2025-03-14 15:09:26 UTC);
        let commands = [
            TimeCommand::SetUtcTime,
            TimeCommand::StartSession,
            TimeCommand::StopSession,
            TimeCommand::SetLap,
        ];
        let reference = build_time_command_at(TimeCommand::SetUtcTime, now);

        for (expected_code, command) in commands.into_iter().enumerate() {
            let payload = build_time_command_at(command, now);
            assert_eq!(payload[1], expected_code as u8);
            assert_eq!(payload[0], reference[0]);
            assert_eq!(payload[2..], reference[2..]);
        }
    }
}
