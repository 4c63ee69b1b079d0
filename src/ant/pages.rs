/// Data page decoding for CORE body temperature broadcasts
use log::debug;

use crate::ant::profile::{
    Payload, PAGE_BATTERY_STATUS, PAGE_MANUFACTURER_INFO, PAGE_PRODUCT_INFO, PAGE_TEMPERATURE,
};
use crate::models::{BatteryStatus, Reading, SensorState};

// Temperature page (0x01)
const EVENT_COUNT_OFFSET: usize = 2;
const SKIN_LOW_OFFSET: usize = 3;
const SHARED_NIBBLE_OFFSET: usize = 4;
const RESERVED_HIGH_OFFSET: usize = 5;
const CORE_TEMP_OFFSET: usize = 6;

// Manufacturer info page (0x50)
const HW_VERSION_OFFSET: usize = 3;
const MANUFACTURER_ID_OFFSET: usize = 4;
const MODEL_NUMBER_OFFSET: usize = 6;

// Product info page (0x51)
const FW_MINOR_OFFSET: usize = 2;
const FW_MAJOR_OFFSET: usize = 3;
const SERIAL_OFFSET: usize = 4;
const FW_MINOR_UNUSED: u8 = 255;

// Battery status page (0x52)
const BATTERY_OFFSET: usize = 7;

/// Wire value flagging an invalid 16-bit temperature (0x8000).
const INVALID_SENTINEL: i16 = i16::MIN;

/// Data pages understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Temperature,
    ManufacturerInfo,
    ProductInfo,
    BatteryStatus,
    Unknown(u8),
}

impl From<u8> for Page {
    fn from(number: u8) -> Self {
        match number {
            PAGE_TEMPERATURE => Page::Temperature,
            PAGE_MANUFACTURER_INFO => Page::ManufacturerInfo,
            PAGE_PRODUCT_INFO => Page::ProductInfo,
            PAGE_BATTERY_STATUS => Page::BatteryStatus,
            other => Page::Unknown(other),
        }
    }
}

/// Result of decoding one payload into a state record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub page: Page,
    /// Observers should be told about the updated state.
    pub notify: bool,
    /// The temperature page event counter wrapped around.
    pub rollover: bool,
}

/// Decode a broadcast payload into `state`
///
/// The first byte selects the data page:
/// - 0x01: event counter, skin temperature, reserved field, core temperature.
///   Only notifies when the event counter moved, so repeated transmissions of
///   the same sample are dropped.
/// - 0x50: hardware version, manufacturer id, model number
/// - 0x51: firmware version, serial number
/// - 0x52: battery status
///
/// Identity and status pages always notify. Unknown pages leave the state
/// untouched.
pub fn decode_page(state: &mut SensorState, payload: &Payload) -> DecodeOutcome {
    let page = Page::from(payload[0]);

    let (notify, rollover) = match page {
        Page::Temperature => decode_temperature(state, payload),
        Page::ManufacturerInfo => {
            decode_manufacturer_info(state, payload);
            (true, false)
        }
        Page::ProductInfo => {
            decode_product_info(state, payload);
            (true, false)
        }
        Page::BatteryStatus => {
            let code = (payload[BATTERY_OFFSET] >> 4) & 0x07;
            state.battery_status = Some(BatteryStatus::from_code(code));
            (true, false)
        }
        Page::Unknown(number) => {
            debug!(
                "Ignoring unknown page 0x{:02X} from device {}",
                number,
                state.device_id()
            );
            (false, false)
        }
    };

    DecodeOutcome {
        page,
        notify,
        rollover,
    }
}

fn decode_temperature(state: &mut SensorState, payload: &Payload) -> (bool, bool) {
    let event_count = payload[EVENT_COUNT_OFFSET];
    let previous = state.event_count;
    let changed = previous != Some(event_count);
    let rollover = matches!(previous, Some(old) if event_count < old);

    if changed {
        state.event_count = Some(event_count);
    }
    if rollover {
        debug!(
            "Event counter rolled over on device {}: {:?} -> {}",
            state.device_id(),
            previous,
            event_count
        );
    }

    // Signed 16-bit, 0.01 °C resolution
    let core = i16::from_le_bytes([payload[CORE_TEMP_OFFSET], payload[CORE_TEMP_OFFSET + 1]]);
    state.core_temperature = Some(f64::from(core) / 100.0);

    // Low byte in offset 3, high nibble in the upper half of offset 4
    let skin = (u16::from(payload[SHARED_NIBBLE_OFFSET] & 0xF0) << 4)
        | u16::from(payload[SKIN_LOW_OFFSET]);
    state.skin_temperature = Some(scaled_reading(skin, 20.0));

    // Lower half of offset 4 is the low nibble, offset 5 the high byte
    let reserved = (u16::from(payload[RESERVED_HIGH_OFFSET]) << 4)
        | u16::from(payload[SHARED_NIBBLE_OFFSET] & 0x0F);
    state.core_reserved = Some(scaled_reading(reserved, 100.0));

    (changed, rollover)
}

/// Scale a packed 12-bit field, mapping the invalid sentinel to `Reading::Invalid`
///
/// The 12 bits are the top of the sensor's 16-bit word, so 0x800 carries 0x8000.
fn scaled_reading(raw: u16, divisor: f64) -> Reading {
    if (raw << 4) as i16 == INVALID_SENTINEL {
        Reading::Invalid
    } else {
        Reading::Valid(f64::from(raw) / divisor)
    }
}

fn decode_manufacturer_info(state: &mut SensorState, payload: &Payload) {
    state.hardware_version = Some(payload[HW_VERSION_OFFSET]);
    state.manufacturer_id = Some(u16::from_le_bytes([
        payload[MANUFACTURER_ID_OFFSET],
        payload[MANUFACTURER_ID_OFFSET + 1],
    ]));
    state.hardware_model_number = Some(u16::from_le_bytes([
        payload[MODEL_NUMBER_OFFSET],
        payload[MODEL_NUMBER_OFFSET + 1],
    ]));
}

fn decode_product_info(state: &mut SensorState, payload: &Payload) {
    let minor = payload[FW_MINOR_OFFSET];
    let major = payload[FW_MAJOR_OFFSET];
    state.firmware_version = Some(if minor == FW_MINOR_UNUSED {
        u16::from(major)
    } else {
        u16::from(major) * 100 + u16::from(minor)
    });

    state.device_serial_number = Some(u32::from_le_bytes([
        payload[SERIAL_OFFSET],
        payload[SERIAL_OFFSET + 1],
        payload[SERIAL_OFFSET + 2],
        payload[SERIAL_OFFSET + 3],
    ]));
}
