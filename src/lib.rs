//! Decoding and command encoding for ANT+ CORE body temperature sensors.
//!
//! The radio itself sits behind [`ant::Transport`]. Received broadcast
//! payloads are handed to either a bound [`sensor::CoreTemperatureSensor`] or a
//! [`scanner::CoreTemperatureScanner`], which decode them with
//! [`ant::decode_page`] and return a [`models::CoreTemperatureEvent`] whenever
//! observers should see the new state.

pub mod ant;
pub mod capture;
pub mod config;
pub mod models;
pub mod scanner;
pub mod sensor;
pub mod utils;

pub use ant::{decode_page, DecodeOutcome, Page, TimeCommand};
pub use models::{BatteryStatus, CoreTemperatureEvent, Reading, ScanEntryState, SensorState};
pub use scanner::{CoreTemperatureScanner, SharedScanTable};
pub use sensor::CoreTemperatureSensor;
