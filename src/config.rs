use log::info;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REPLAY_INTERVAL_MS: u64 = 500; // 2 Hz broadcast rate

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Track every CORE sensor in range
    Scan,
    /// Bind a single sensor and sync its clock
    Sensor,
}

#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub capture_path: PathBuf,
    pub mode: Mode,
    pub device_id: u16,
    pub replay_interval: Duration,
    pub sync_time: bool,
}

impl SensorConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, used directly by tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let capture_path = lookup("CORE_TEMP_CAPTURE")
            .map(PathBuf::from)
            .ok_or("CORE_TEMP_CAPTURE environment variable not set")?;

        let mode = match lookup("CORE_TEMP_MODE").as_deref().map(str::trim) {
            None | Some("") | Some("scan") => Mode::Scan,
            Some("sensor") => Mode::Sensor,
            Some(other) => {
                return Err(format!(
                    "CORE_TEMP_MODE must be 'scan' or 'sensor', got '{}'",
                    other
                )
                .into())
            }
        };

        let device_id = match lookup("CORE_TEMP_DEVICE_ID") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|e| format!("Invalid CORE_TEMP_DEVICE_ID '{}': {}", value, e))?,
            None => 0,
        };

        let replay_interval = match lookup("CORE_TEMP_REPLAY_INTERVAL_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| format!("Invalid CORE_TEMP_REPLAY_INTERVAL_MS '{}': {}", value, e))?,
            None => Duration::from_millis(DEFAULT_REPLAY_INTERVAL_MS),
        };

        let sync_time = match lookup("CORE_TEMP_SYNC_TIME") {
            Some(value) => value
                .trim()
                .parse::<bool>()
                .map_err(|e| format!("Invalid CORE_TEMP_SYNC_TIME '{}': {}", value, e))?,
            None => true,
        };

        info!(
            "Configuration: mode={:?}, device_id={}, capture={}",
            mode,
            device_id,
            capture_path.display()
        );

        Ok(SensorConfig {
            capture_path,
            mode,
            device_id,
            replay_interval,
            sync_time,
        })
    }
}
