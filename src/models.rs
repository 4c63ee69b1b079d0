/// State records maintained for CORE body temperature sensors
use std::fmt;

/// Core temperatures at or below this value mean the sensor is not on a body yet.
pub const VALID_CORE_TEMPERATURE: f64 = 24.0;

/// ANT+ manufacturer id assigned to greenTEG, the CORE developer.
pub const CORE_MANUFACTURER_ID: u16 = 303;

/// Battery status reported on page 0x52
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryStatus {
    New,
    Good,
    Ok,
    Low,
    Critical,
}

impl BatteryStatus {
    /// Map the 3-bit wire code to a status.
    ///
    /// Codes 1..=5 are defined by the profile. 0 (not set), 6 (reserved) and
    /// 7 (invalid) are reported as `Ok` so that consumers see a neutral status.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => BatteryStatus::New,
            2 => BatteryStatus::Good,
            3 => BatteryStatus::Ok,
            4 => BatteryStatus::Low,
            5 => BatteryStatus::Critical,
            _ => BatteryStatus::Ok,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatteryStatus::New => "New",
            BatteryStatus::Good => "Good",
            BatteryStatus::Ok => "Ok",
            BatteryStatus::Low => "Low",
            BatteryStatus::Critical => "Critical",
        }
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A temperature-like field that the sensor can flag as invalid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Valid(f64),
    Invalid,
}

impl Reading {
    /// Value in degrees, with invalid readings reported as 0.0.
    pub fn degrees(&self) -> f64 {
        match self {
            Reading::Valid(value) => *value,
            Reading::Invalid => 0.0,
        }
    }

    pub fn valid(&self) -> Option<f64> {
        match self {
            Reading::Valid(value) => Some(*value),
            Reading::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Reading::Valid(_))
    }
}

/// Measurement interval a sensor can be configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementInterval {
    QuarterSecond,
    HalfSecond,
    OneSecond,
    TwoSeconds,
}

impl MeasurementInterval {
    pub fn as_secs_f32(&self) -> f32 {
        match self {
            MeasurementInterval::QuarterSecond => 0.25,
            MeasurementInterval::HalfSecond => 0.5,
            MeasurementInterval::OneSecond => 1.0,
            MeasurementInterval::TwoSeconds => 2.0,
        }
    }
}

/// Decoded state of one physical sensor
///
/// Every decoded field starts out as `None` and is overwritten in place as
/// pages arrive. The device id is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    device_id: u16,
    pub event_count: Option<u8>,
    pub core_temperature: Option<f64>,
    pub skin_temperature: Option<Reading>,
    pub core_reserved: Option<Reading>,
    pub battery_status: Option<BatteryStatus>,
    pub hardware_version: Option<u8>,
    pub manufacturer_id: Option<u16>,
    pub hardware_model_number: Option<u16>,
    pub firmware_version: Option<u16>,
    pub device_serial_number: Option<u32>,
    pub uses_heart_rate: Option<bool>,
    pub utc_time_required: Option<bool>,
    pub measurement_interval: Option<MeasurementInterval>,
}

impl SensorState {
    pub fn new(device_id: u16) -> Self {
        SensorState {
            device_id,
            event_count: None,
            core_temperature: None,
            skin_temperature: None,
            core_reserved: None,
            battery_status: None,
            hardware_version: None,
            manufacturer_id: None,
            hardware_model_number: None,
            firmware_version: None,
            device_serial_number: None,
            uses_heart_rate: None,
            utc_time_required: None,
            measurement_interval: None,
        }
    }

    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// Check that the last core temperature is a real on-body reading
    pub fn has_valid_core_temperature(&self) -> bool {
        self.core_temperature
            .map(|temperature| temperature > VALID_CORE_TEMPERATURE)
            .unwrap_or(false)
    }

    pub fn is_core_manufacturer(&self) -> bool {
        self.manufacturer_id == Some(CORE_MANUFACTURER_ID)
    }
}

/// Sensor state observed in scan mode, with the link quality of the last payload
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntryState {
    pub sensor: SensorState,
    pub rssi: Option<i8>,
    pub threshold: Option<i8>,
}

impl ScanEntryState {
    pub fn new(device_id: u16) -> Self {
        ScanEntryState {
            sensor: SensorState::new(device_id),
            rssi: None,
            threshold: None,
        }
    }

    pub fn device_id(&self) -> u16 {
        self.sensor.device_id()
    }
}

/// Event handed to observers whenever a state record changed
#[derive(Debug, Clone, PartialEq)]
pub struct CoreTemperatureEvent<S> {
    pub device_id: u16,
    pub state: S,
}

impl<S> CoreTemperatureEvent<S> {
    pub const NAME: &'static str = "core-temperature-data";
}
