/// Single CORE sensor bound to a receive channel
use log::{info, warn};
use time::UtcOffset;

use crate::ant::{
    build_time_command, build_time_command_in, decode_page, ChannelConfig, ChannelId, Payload,
    SendCallback, TimeCommand, Transport, TransportError,
};
use crate::models::{CoreTemperatureEvent, SensorState};

/// Wildcard device number: bind to whichever sensor is heard first.
pub const ANY_DEVICE: u16 = 0;

pub struct CoreTemperatureSensor<T: Transport> {
    transport: T,
    channel: ChannelId,
    state: SensorState,
    utc_offset: Option<UtcOffset>,
}

impl<T: Transport> CoreTemperatureSensor<T> {
    /// Open a receive channel for `device_id` and create its state record
    pub fn attach(mut transport: T, device_id: u16) -> Result<Self, TransportError> {
        let channel = transport.bind_channel(&ChannelConfig::core_receive(device_id))?;
        info!(
            "Bound CORE sensor channel {} to device {}",
            channel, device_id
        );

        Ok(CoreTemperatureSensor {
            transport,
            channel,
            state: SensorState::new(device_id),
            utc_offset: None,
        })
    }

    /// Stamp time commands with a fixed offset instead of looking it up per send
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle a broadcast payload delivered on this sensor's channel
    ///
    /// Returns an event when observers should see the updated state.
    pub fn on_receive(
        &mut self,
        device_id: u16,
        payload: &Payload,
    ) -> Option<CoreTemperatureEvent<SensorState>> {
        if self.state.device_id() == ANY_DEVICE {
            info!("Wildcard channel {} paired with device {}", self.channel, device_id);
            self.state = SensorState::new(device_id);
        } else if self.state.device_id() != device_id {
            warn!(
                "Ignoring payload from device {} on channel bound to {}",
                device_id,
                self.state.device_id()
            );
            return None;
        }

        let outcome = decode_page(&mut self.state, payload);
        if !outcome.notify {
            return None;
        }

        Some(CoreTemperatureEvent {
            device_id,
            state: self.state.clone(),
        })
    }

    pub fn set_utc_time(&mut self, callback: Option<SendCallback>) {
        self.send_time_command(TimeCommand::SetUtcTime, callback);
    }

    pub fn start_session(&mut self, callback: Option<SendCallback>) {
        self.send_time_command(TimeCommand::StartSession, callback);
    }

    pub fn stop_session(&mut self, callback: Option<SendCallback>) {
        self.send_time_command(TimeCommand::StopSession, callback);
    }

    pub fn set_lap(&mut self, callback: Option<SendCallback>) {
        self.send_time_command(TimeCommand::SetLap, callback);
    }

    fn send_time_command(&mut self, command: TimeCommand, callback: Option<SendCallback>) {
        let payload = match self.utc_offset {
            Some(offset) => build_time_command_in(command, offset),
            None => build_time_command(command),
        };
        info!("Sending {:?} on channel {}", command, self.channel);
        self.transport
            .send_acknowledged(self.channel, payload, callback);
    }

    /// Close the channel, ending the session and dropping the state record
    pub fn detach(mut self) -> Result<T, TransportError> {
        self.transport.close_channel(self.channel)?;
        info!(
            "Closed CORE sensor channel {} (device {})",
            self.channel,
            self.state.device_id()
        );
        Ok(self.transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ant::transport::mock::MockTransport;
    use crate::ant::ChannelMode;
    use std::sync::{Arc, Mutex};

    const TEMPERATURE: Payload = [0x01, 0xFF, 7, 0x90, 0x01, 0x00, 0x74, 0x0E];

    #[test]
    fn attach_binds_receive_channel() {
        let sensor = CoreTemperatureSensor::attach(MockTransport::default(), 555).unwrap();
        let bound = &sensor.transport().bound;

        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].mode, ChannelMode::Receive);
        assert_eq!(bound[0].device_id, 555);
        assert_eq!(sensor.state().device_id(), 555);
    }

    #[test]
    fn emits_event_only_on_new_reading() {
        let mut sensor = CoreTemperatureSensor::attach(MockTransport::default(), 555).unwrap();

        let event = sensor.on_receive(555, &TEMPERATURE).unwrap();
        assert_eq!(event.device_id, 555);
        assert_eq!(event.state.core_temperature, Some(37.0));
        assert_eq!(event.state.event_count, Some(7));

        assert!(sensor.on_receive(555, &TEMPERATURE).is_none());
    }

    #[test]
    fn ignores_foreign_device() {
        let mut sensor = CoreTemperatureSensor::attach(MockTransport::default(), 555).unwrap();

        assert!(sensor.on_receive(556, &TEMPERATURE).is_none());
        assert_eq!(sensor.state().core_temperature, None);
        assert_eq!(sensor.state().device_id(), 555);
    }

    #[test]
    fn wildcard_pairs_with_first_device() {
        let mut sensor =
            CoreTemperatureSensor::attach(MockTransport::default(), ANY_DEVICE).unwrap();

        assert!(sensor.on_receive(901, &TEMPERATURE).is_some());
        assert_eq!(sensor.state().device_id(), 901);
        assert!(sensor.on_receive(902, &[0x52, 0, 0, 0, 0, 0, 0, 0x10]).is_none());
    }

    #[test]
    fn session_commands_use_bound_channel() {
        let mut sensor = CoreTemperatureSensor::attach(MockTransport::default(), 1).unwrap();
        sensor.set_utc_time(None);
        sensor.start_session(None);
        sensor.set_lap(None);
        sensor.stop_session(None);

        let sent = &sensor.transport().sent;
        let codes: Vec<u8> = sent.iter().map(|(_, payload)| payload[1]).collect();
        assert_eq!(codes, vec![0x00, 0x01, 0x03, 0x02]);
        assert!(sent
            .iter()
            .all(|(channel, payload)| *channel == 0 && payload[0] == 0x10 && payload[2] == 0xFF));
    }

    #[test]
    fn fixed_offset_is_used_for_commands() {
        let mut sensor = CoreTemperatureSensor::attach(MockTransport::default(), 1)
            .unwrap()
            .with_utc_offset(UtcOffset::from_hms(-3, -30, 0).unwrap());
        sensor.set_utc_time(None);

        assert_eq!(sensor.transport().sent[0].1[3], (-14i8) as u8);
    }

    #[test]
    fn send_failure_reaches_callback() {
        let transport = MockTransport {
            fail_sends: true,
            ..Default::default()
        };
        let mut sensor = CoreTemperatureSensor::attach(transport, 1).unwrap();

        let result = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        sensor.set_utc_time(Some(Box::new(move |outcome| {
            *slot.lock().unwrap() = Some(outcome);
        })));

        assert_eq!(
            *result.lock().unwrap(),
            Some(Err(TransportError::SendFailed {
                channel: 0,
                attempts: 3
            }))
        );
    }

    #[test]
    fn detach_closes_channel() {
        let sensor = CoreTemperatureSensor::attach(MockTransport::default(), 1).unwrap();
        let transport = sensor.detach().unwrap();
        assert_eq!(transport.closed, vec![0]);
    }
}
