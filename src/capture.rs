/// Capture files of recorded CORE broadcasts and a transport that replays them
///
/// One record per line: `<device_id> <payload hex> [<rssi> <threshold>]`.
/// Blank lines and lines starting with `#` are skipped.
use log::{debug, info};
use std::path::Path;
use thiserror::Error;

use crate::ant::profile::PAYLOAD_LEN;
use crate::ant::{ChannelConfig, ChannelId, Payload, SendCallback, Transport, TransportError};
use crate::utils::{hex_dump, parse_hex};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read capture file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: invalid device id '{value}'")]
    InvalidDeviceId { line: usize, value: String },
    #[error("line {line}: invalid hex payload '{value}'")]
    InvalidHex { line: usize, value: String },
    #[error("line {line}: payload must be {} bytes, got {actual}", PAYLOAD_LEN)]
    InvalidLength { line: usize, actual: usize },
    #[error("line {line}: invalid signal value '{value}'")]
    InvalidSignal { line: usize, value: String },
}

/// Link quality reported alongside a payload in scan mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub rssi: i8,
    pub threshold: i8,
}

/// One received broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub device_id: u16,
    pub payload: Payload,
    pub signal: Option<Signal>,
}

pub fn parse_capture(input: &str) -> Result<Vec<CaptureRecord>, CaptureError> {
    let mut records = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        records.push(parse_record(line_number, line)?);
    }

    Ok(records)
}

pub async fn load_capture(path: impl AsRef<Path>) -> Result<Vec<CaptureRecord>, CaptureError> {
    let contents = tokio::fs::read_to_string(path.as_ref()).await?;
    let records = parse_capture(&contents)?;
    info!(
        "Loaded {} records from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}

fn parse_record(line: usize, text: &str) -> Result<CaptureRecord, CaptureError> {
    let mut fields = text.split_whitespace();

    let device_field = fields
        .next()
        .ok_or(CaptureError::MissingField { line, field: "device id" })?;
    let device_id = device_field
        .parse::<u16>()
        .map_err(|_| CaptureError::InvalidDeviceId {
            line,
            value: device_field.to_string(),
        })?;

    let hex_field = fields
        .next()
        .ok_or(CaptureError::MissingField { line, field: "payload" })?;
    let bytes = parse_hex(hex_field).ok_or_else(|| CaptureError::InvalidHex {
        line,
        value: hex_field.to_string(),
    })?;
    let payload: Payload = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CaptureError::InvalidLength {
            line,
            actual: bytes.len(),
        })?;

    let signal = match fields.next() {
        None => None,
        Some(rssi) => {
            let threshold = fields
                .next()
                .ok_or(CaptureError::MissingField { line, field: "threshold" })?;
            Some(Signal {
                rssi: parse_signal(line, rssi)?,
                threshold: parse_signal(line, threshold)?,
            })
        }
    };

    Ok(CaptureRecord {
        device_id,
        payload,
        signal,
    })
}

fn parse_signal(line: usize, value: &str) -> Result<i8, CaptureError> {
    value.parse::<i8>().map_err(|_| CaptureError::InvalidSignal {
        line,
        value: value.to_string(),
    })
}

/// Transport standing in for the radio while replaying a capture
///
/// Acknowledged sends always succeed while the channel is open.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    channels: Vec<(ChannelConfig, bool)>,
    sent: Vec<(ChannelId, Payload)>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[(ChannelId, Payload)] {
        &self.sent
    }

    fn is_open(&self, channel: ChannelId) -> bool {
        self.channels
            .get(usize::from(channel))
            .map(|(_, open)| *open)
            .unwrap_or(false)
    }
}

impl Transport for ReplayTransport {
    fn bind_channel(&mut self, config: &ChannelConfig) -> Result<ChannelId, TransportError> {
        let channel =
            ChannelId::try_from(self.channels.len()).map_err(|_| TransportError::ChannelUnavailable)?;
        debug!("Replay channel {} bound with {:?}", channel, config);
        self.channels.push((*config, true));
        Ok(channel)
    }

    fn send_acknowledged(
        &mut self,
        channel: ChannelId,
        payload: Payload,
        callback: Option<SendCallback>,
    ) {
        let result = if self.is_open(channel) {
            info!(
                "Acknowledged send on channel {}: {}",
                channel,
                hex_dump(&payload)
            );
            self.sent.push((channel, payload));
            Ok(())
        } else {
            Err(TransportError::NotBound(channel))
        };

        if let Some(callback) = callback {
            callback(result);
        }
    }

    fn close_channel(&mut self, channel: ChannelId) -> Result<(), TransportError> {
        match self.channels.get_mut(usize::from(channel)) {
            Some((_, open)) if *open => {
                *open = false;
                Ok(())
            }
            _ => Err(TransportError::NotBound(channel)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn parses_records_with_and_without_signal() {
        let input = "\
# device payload rssi threshold
1201 01FF07900100740E -45 -90

1202 52000000000000 30
";
        // Second record is one byte short
        let err = parse_capture(input).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidLength { line: 4, actual: 7 }));

        let records = parse_capture("1201 01ff07900100740e -45 -90\n1202 5200000000000030\n")
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].device_id, 1201);
        assert_eq!(records[0].payload, [0x01, 0xFF, 0x07, 0x90, 0x01, 0x00, 0x74, 0x0E]);
        assert_eq!(
            records[0].signal,
            Some(Signal {
                rssi: -45,
                threshold: -90
            })
        );
        assert_eq!(records[1].signal, None);
    }

    #[test]
    fn reports_line_of_bad_field() {
        let err = parse_capture("1 0100000000000000\nabc 0100000000000000\n").unwrap_err();
        assert_eq!(err.to_string(), "line 2: invalid device id 'abc'");

        let err = parse_capture("1 01000000000000zz\n").unwrap_err();
        assert!(matches!(err, CaptureError::InvalidHex { line: 1, .. }));

        let err = parse_capture("1 0100000000000000 -40\n").unwrap_err();
        assert!(matches!(
            err,
            CaptureError::MissingField {
                line: 1,
                field: "threshold"
            }
        ));

        let err = parse_capture("1 0100000000000000 -400 -90\n").unwrap_err();
        assert!(matches!(err, CaptureError::InvalidSignal { line: 1, .. }));
    }

    #[test]
    fn replay_transport_rejects_sends_on_closed_channel() {
        let mut transport = ReplayTransport::new();
        let channel = transport.bind_channel(&ChannelConfig::core_scan()).unwrap();

        transport.send_acknowledged(channel, [0x10; 8], None);
        assert_eq!(transport.sent().len(), 1);

        transport.close_channel(channel).unwrap();
        let outcome = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&outcome);
        transport.send_acknowledged(
            channel,
            [0x10; 8],
            Some(Box::new(move |result| *slot.lock().unwrap() = Some(result))),
        );

        assert_eq!(
            *outcome.lock().unwrap(),
            Some(Err(TransportError::NotBound(channel)))
        );
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(
            transport.close_channel(channel),
            Err(TransportError::NotBound(channel))
        );
    }
}
