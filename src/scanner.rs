/// Scan mode: decode broadcasts from every CORE sensor in range
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ant::{decode_page, ChannelConfig, ChannelId, Payload, Transport, TransportError};
use crate::models::{CoreTemperatureEvent, ScanEntryState};

/// Per-device state table for a scanning channel
///
/// Entries live until the scan is stopped.
pub struct CoreTemperatureScanner<T: Transport> {
    transport: T,
    channel: ChannelId,
    states: HashMap<u16, ScanEntryState>,
}

impl<T: Transport> CoreTemperatureScanner<T> {
    pub fn start(mut transport: T) -> Result<Self, TransportError> {
        let channel = transport.bind_channel(&ChannelConfig::core_scan())?;
        info!("Started CORE scan on channel {}", channel);

        Ok(CoreTemperatureScanner {
            transport,
            channel,
            states: HashMap::new(),
        })
    }

    pub fn create_state_if_new(&mut self, device_id: u16) -> &mut ScanEntryState {
        self.states.entry(device_id).or_insert_with(|| {
            debug!("New CORE sensor {} seen while scanning", device_id);
            ScanEntryState::new(device_id)
        })
    }

    pub fn update_rssi_and_threshold(&mut self, device_id: u16, rssi: i8, threshold: i8) {
        let entry = self.create_state_if_new(device_id);
        entry.rssi = Some(rssi);
        entry.threshold = Some(threshold);
    }

    /// Decode a payload into the entry for `device_id`
    pub fn on_receive(
        &mut self,
        device_id: u16,
        payload: &Payload,
    ) -> Option<CoreTemperatureEvent<ScanEntryState>> {
        let entry = self.create_state_if_new(device_id);
        decode_entry(entry, payload)
    }

    /// Store link quality for `device_id` then decode its payload
    pub fn on_receive_with_signal(
        &mut self,
        device_id: u16,
        payload: &Payload,
        rssi: i8,
        threshold: i8,
    ) -> Option<CoreTemperatureEvent<ScanEntryState>> {
        self.update_rssi_and_threshold(device_id, rssi, threshold);
        self.on_receive(device_id, payload)
    }

    pub fn get(&self, device_id: u16) -> Option<&ScanEntryState> {
        self.states.get(&device_id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Close the scan channel and drop every entry
    pub fn stop(mut self) -> Result<T, TransportError> {
        self.transport.close_channel(self.channel)?;
        info!(
            "Stopped CORE scan on channel {} ({} sensors seen)",
            self.channel,
            self.states.len()
        );
        Ok(self.transport)
    }
}

fn decode_entry(
    entry: &mut ScanEntryState,
    payload: &Payload,
) -> Option<CoreTemperatureEvent<ScanEntryState>> {
    let outcome = decode_page(&mut entry.sensor, payload);
    if !outcome.notify {
        return None;
    }

    Some(CoreTemperatureEvent {
        device_id: entry.device_id(),
        state: entry.clone(),
    })
}

/// Scan table that can be fed from several worker threads
///
/// The outer lock is only held to find or insert an entry. Each entry has its
/// own lock, so payloads for one device are decoded in turn while other
/// devices proceed independently.
#[derive(Clone, Default)]
pub struct SharedScanTable {
    states: Arc<Mutex<HashMap<u16, Arc<Mutex<ScanEntryState>>>>>,
}

impl SharedScanTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, device_id: u16) -> Arc<Mutex<ScanEntryState>> {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            states
                .entry(device_id)
                .or_insert_with(|| Arc::new(Mutex::new(ScanEntryState::new(device_id)))),
        )
    }

    pub fn on_receive_with_signal(
        &self,
        device_id: u16,
        payload: &Payload,
        rssi: i8,
        threshold: i8,
    ) -> Option<CoreTemperatureEvent<ScanEntryState>> {
        let entry = self.entry(device_id);
        let mut entry = lock_entry(&entry);
        entry.rssi = Some(rssi);
        entry.threshold = Some(threshold);
        decode_entry(&mut entry, payload)
    }

    pub fn snapshot(&self, device_id: u16) -> Option<ScanEntryState> {
        let entry = {
            let states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
            states.get(&device_id).cloned()
        }?;
        let state = lock_entry(&entry).clone();
        Some(state)
    }

    pub fn len(&self) -> usize {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_entry(entry: &Mutex<ScanEntryState>) -> MutexGuard<'_, ScanEntryState> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}
