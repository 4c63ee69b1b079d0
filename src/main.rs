use log::{error, info, warn};
use time::{OffsetDateTime, UtcOffset};
use tokio::time::{sleep, Duration};

use core_temp_ant::capture::{load_capture, CaptureRecord, ReplayTransport};
use core_temp_ant::config::{Mode, SensorConfig};
use core_temp_ant::models::{CoreTemperatureEvent, Reading, SensorState};
use core_temp_ant::scanner::CoreTemperatureScanner;
use core_temp_ant::sensor::CoreTemperatureSensor;
use core_temp_ant::utils::format_datetime;

/// One-line summary of a state record for the log
fn describe(state: &SensorState) -> String {
    let core = state
        .core_temperature
        .map(|t| format!("{:.2}°C", t))
        .unwrap_or_else(|| "-".to_string());
    let skin = match state.skin_temperature {
        Some(Reading::Valid(t)) => format!("{:.2}°C", t),
        Some(Reading::Invalid) => "invalid".to_string(),
        None => "-".to_string(),
    };
    let battery = state
        .battery_status
        .map(|b| b.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "core={} skin={} battery={} on_body={}",
        core,
        skin,
        battery,
        state.has_valid_core_temperature()
    )
}

async fn pace(interval: Duration) {
    if !interval.is_zero() {
        sleep(interval).await;
    }
}

async fn replay_scan(
    config: &SensorConfig,
    records: Vec<CaptureRecord>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut scanner = CoreTemperatureScanner::start(ReplayTransport::new())?;

    for record in records {
        let event = match record.signal {
            Some(signal) => scanner.on_receive_with_signal(
                record.device_id,
                &record.payload,
                signal.rssi,
                signal.threshold,
            ),
            None => scanner.on_receive(record.device_id, &record.payload),
        };

        if let Some(event) = event {
            info!(
                "{} [{}] {}: {} rssi={:?}",
                CoreTemperatureEvent::<SensorState>::NAME,
                format_datetime(&OffsetDateTime::now_utc()),
                event.device_id,
                describe(&event.state.sensor),
                event.state.rssi
            );
        }

        pace(config.replay_interval).await;
    }

    if scanner.is_empty() {
        warn!("No CORE sensors seen in capture!");
    }

    scanner.stop()?;
    Ok(())
}

async fn replay_sensor(
    config: &SensorConfig,
    records: Vec<CaptureRecord>,
    utc_offset: UtcOffset,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sensor =
        CoreTemperatureSensor::attach(ReplayTransport::new(), config.device_id)?
            .with_utc_offset(utc_offset);

    if config.sync_time {
        sensor.set_utc_time(Some(Box::new(|result| match result {
            Ok(()) => info!("Sensor clock synchronized"),
            Err(e) => error!("Failed to set sensor UTC time: {}", e),
        })));
    }

    for record in records {
        if let Some(event) = sensor.on_receive(record.device_id, &record.payload) {
            info!(
                "{} [{}] {}: {}",
                CoreTemperatureEvent::<SensorState>::NAME,
                format_datetime(&OffsetDateTime::now_utc()),
                event.device_id,
                describe(&event.state)
            );
        }

        pace(config.replay_interval).await;
    }

    let state = sensor.state().clone();
    info!("Summary for device {}:", state.device_id());
    info!("  {}", describe(&state));
    info!(
        "  Manufacturer: {:?}, model: {:?}, hardware: {:?}",
        state.manufacturer_id, state.hardware_model_number, state.hardware_version
    );
    info!(
        "  Firmware: {:?}, serial: {:?}",
        state.firmware_version, state.device_serial_number
    );

    sensor.detach()?;
    Ok(())
}

async fn main_loop(
    config: SensorConfig,
    utc_offset: UtcOffset,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting CORE temperature replay");

    let records = load_capture(&config.capture_path).await?;
    match config.mode {
        Mode::Scan => replay_scan(&config, records).await,
        Mode::Sensor => replay_sensor(&config, records, utc_offset).await,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Resolve the local offset while still single threaded
    let utc_offset = match UtcOffset::current_local_offset() {
        Ok(offset) => offset,
        Err(e) => {
            warn!("Could not determine local UTC offset, using UTC: {}", e);
            UtcOffset::UTC
        }
    };

    // Load configuration
    let config = match SensorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        // Handle Ctrl+C gracefully
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            let _ = tx.send(());
        });

        tokio::select! {
            result = main_loop(config, utc_offset) => {
                match result {
                    Ok(_) => info!("Replay completed successfully"),
                    Err(e) => error!("Fatal error: {}", e),
                }
            }
            Ok(()) = &mut rx => {
                info!("Program terminated by user. Exiting gracefully.");
            }
        }
    });

    Ok(())
}
