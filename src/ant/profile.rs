/// ANT+ CORE body temperature device profile constants

/// Device type the sensor advertises.
pub const DEVICE_TYPE: u8 = 0x7F;

/// Channel period in 1/32768 s units: 32768 / 16384 = 2 Hz broadcasts.
pub const CHANNEL_PERIOD: u16 = 16384;

/// Search timeout handed to the transport when opening a channel.
pub const SENSOR_TIMEOUT: u8 = 255;

/// Transmission type used when binding; 0 lets the transport pair any type.
pub const TRANSMISSION_TYPE_ANY: u8 = 0;

/// Every broadcast and acknowledged message carries 8 data bytes.
pub const PAYLOAD_LEN: usize = 8;

pub type Payload = [u8; PAYLOAD_LEN];

/// Data page numbers
pub const PAGE_TEMPERATURE: u8 = 0x01;
pub const PAGE_MANUFACTURER_INFO: u8 = 0x50;
pub const PAGE_PRODUCT_INFO: u8 = 0x51;
pub const PAGE_BATTERY_STATUS: u8 = 0x52;

/// Command page sent to the sensor to sync time and control sessions.
pub const PAGE_TIME_COMMAND: u8 = 0x10;
