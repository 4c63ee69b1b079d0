/// Boundary to the ANT radio layer that owns channels and message framing
use thiserror::Error;

use crate::ant::profile::{
    Payload, CHANNEL_PERIOD, DEVICE_TYPE, SENSOR_TIMEOUT, TRANSMISSION_TYPE_ANY,
};

pub type ChannelId = u8;

/// Completion callback for an acknowledged send
pub type SendCallback = Box<dyn FnOnce(Result<(), TransportError>) + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no free channel available")]
    ChannelUnavailable,
    #[error("channel {0} is not bound")]
    NotBound(ChannelId),
    #[error("acknowledged send on channel {channel} failed after {attempts} attempts")]
    SendFailed { channel: ChannelId, attempts: u8 },
    #[error("transport closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// Slave channel tracking one device
    Receive,
    /// Continuous scan picking up every device of the type
    Scan,
}

/// Parameters used to open a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub mode: ChannelMode,
    pub device_id: u16,
    pub device_type: u8,
    pub transmission_type: u8,
    pub timeout: u8,
    pub period: u16,
}

impl ChannelConfig {
    /// Channel for one CORE sensor; device id 0 pairs with the first one found
    pub fn core_receive(device_id: u16) -> Self {
        ChannelConfig {
            mode: ChannelMode::Receive,
            device_id,
            device_type: DEVICE_TYPE,
            transmission_type: TRANSMISSION_TYPE_ANY,
            timeout: SENSOR_TIMEOUT,
            period: CHANNEL_PERIOD,
        }
    }

    pub fn core_scan() -> Self {
        ChannelConfig {
            mode: ChannelMode::Scan,
            device_id: 0,
            ..Self::core_receive(0)
        }
    }
}

/// Radio transport consumed by the sensor containers
///
/// Payload delivery runs the other way: whoever drives the transport hands
/// received payloads to the container's `on_receive` methods.
pub trait Transport {
    fn bind_channel(&mut self, config: &ChannelConfig) -> Result<ChannelId, TransportError>;

    /// Queue an acknowledged message; the transport retries until acked or it
    /// gives up, then reports the outcome through `callback`.
    fn send_acknowledged(
        &mut self,
        channel: ChannelId,
        payload: Payload,
        callback: Option<SendCallback>,
    );

    fn close_channel(&mut self, channel: ChannelId) -> Result<(), TransportError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    /// In-memory transport recording everything it is asked to do
    #[derive(Debug, Default)]
    pub struct MockTransport {
        pub bound: Vec<ChannelConfig>,
        pub sent: Vec<(ChannelId, Payload)>,
        pub closed: Vec<ChannelId>,
        pub fail_sends: bool,
    }

    impl Transport for MockTransport {
        fn bind_channel(&mut self, config: &ChannelConfig) -> Result<ChannelId, TransportError> {
            self.bound.push(*config);
            Ok((self.bound.len() - 1) as ChannelId)
        }

        fn send_acknowledged(
            &mut self,
            channel: ChannelId,
            payload: Payload,
            callback: Option<SendCallback>,
        ) {
            self.sent.push((channel, payload));
            let result = if self.fail_sends {
                Err(TransportError::SendFailed {
                    channel,
                    attempts: 3,
                })
            } else {
                Ok(())
            };
            if let Some(callback) = callback {
                callback(result);
            }
        }

        fn close_channel(&mut self, channel: ChannelId) -> Result<(), TransportError> {
            self.closed.push(channel);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_channel_configs_use_profile_constants() {
        let receive = ChannelConfig::core_receive(1234);
        assert_eq!(receive.mode, ChannelMode::Receive);
        assert_eq!(receive.device_id, 1234);
        assert_eq!(receive.device_type, 0x7F);
        assert_eq!(receive.timeout, 255);
        assert_eq!(receive.period, 16384);

        let scan = ChannelConfig::core_scan();
        assert_eq!(scan.mode, ChannelMode::Scan);
        assert_eq!(scan.device_id, 0);
        assert_eq!(scan.device_type, 0x7F);
    }
}
