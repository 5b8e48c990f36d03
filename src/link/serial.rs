//! Serial port plumbing for the EEG board and the actuator
//!
//! Handles opening both ends with the configured baud rates. The sensor port
//! gets the per-read timeout so a silent board never stalls the loop longer
//! than one timeout.

use std::io::BufReader;
use std::time::Duration;

use serialport::SerialPort;

use super::{LineSensor, WriterSink};
use crate::config::SerialConfig;
use crate::error::LinkError;

pub type SerialSensor = LineSensor<BufReader<Box<dyn SerialPort>>>;
pub type SerialActuator = WriterSink<Box<dyn SerialPort>>;

fn open_port(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Box<dyn SerialPort>, LinkError> {
    serialport::new(port_name, baud_rate)
        .timeout(timeout)
        .open()
        .map_err(|err| LinkError::OpenFailed {
            port: port_name.to_string(),
            reason: err.to_string(),
        })
}

/// Open the EEG sample stream
///
/// # Arguments
/// * `serial` - Port name, baud rate and read timeout
///
/// # Errors
/// Returns `LinkError::OpenFailed` if the port cannot be opened
pub fn open_sensor(serial: &SerialConfig) -> Result<SerialSensor, LinkError> {
    let port = open_port(
        &serial.sensor_port,
        serial.sensor_baud,
        Duration::from_millis(serial.read_timeout_ms),
    )?;
    log::info!(
        "[Serial] Sensor open on {} @ {} baud",
        serial.sensor_port,
        serial.sensor_baud
    );
    Ok(LineSensor::new(BufReader::new(port)).with_error_limit(serial.max_read_errors))
}

/// Open the actuator command channel
pub fn open_actuator(serial: &SerialConfig) -> Result<SerialActuator, LinkError> {
    let port = open_port(
        &serial.actuator_port,
        serial.actuator_baud,
        Duration::from_millis(serial.read_timeout_ms),
    )?;
    log::info!(
        "[Serial] Actuator open on {} @ {} baud",
        serial.actuator_port,
        serial.actuator_baud
    );
    Ok(WriterSink::new(port))
}

/// List available serial ports
#[must_use]
pub fn list_ports() -> Vec<String> {
    serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .unwrap_or_default()
}
