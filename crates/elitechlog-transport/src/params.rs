//! Device parameters as reported by a transport adapter.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{ReadingTable, TransportKind};

/// Sensor type code reported by loggers whose second sensor measures temperature.
pub const SENSOR_TYPE_TEMPERATURE: u8 = 21;

/// Work mode of a logger that is not recording and holds no readings.
pub const WORK_MODE_IDLE: u8 = 0;

/// Work mode of a logger that has stopped recording and still holds readings.
pub const WORK_MODE_STOPPED: u8 = 2;

/// Everything known about a connected logger.
///
/// `kind` is the runtime tag telling which adapter produced (and must
/// receive) these parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub kind: TransportKind,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Label of the import batch; derived at storage time when absent.
    #[serde(default)]
    pub data_name: Option<String>,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub config: DeviceConfig,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub readings: ReadingTable,
}

impl Parameters {
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            serial_number: None,
            model: None,
            data_name: None,
            status: DeviceStatus::default(),
            config: DeviceConfig::default(),
            capabilities: Capabilities::default(),
            readings: ReadingTable::default(),
        }
    }

    /// Serial number, falling back to the model name.
    pub fn identity_label(&self) -> &str {
        self.serial_number
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.model.as_deref())
            .unwrap_or("unknown")
    }
}

/// Read-only state of the logger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceStatus {
    pub travel_number: Option<String>,
    /// Readings currently held by the device.
    pub record_count: u32,
    /// Maximum number of readings the device can hold.
    pub capacity: u32,
    pub max_value1: Option<f64>,
    pub min_value1: Option<f64>,
    pub max_value2: Option<f64>,
    pub min_value2: Option<f64>,
    pub sensor2_available: bool,
    pub sensor2_type_code: Option<u8>,
    pub started_at: Option<NaiveDateTime>,
    pub alarm_status: i64,
    pub work_mode: u8,
    pub battery: Option<String>,
    pub state: Option<String>,
    pub expected_stop: Option<NaiveDateTime>,
}

impl DeviceStatus {
    /// Label for the second sensor, if present.
    pub fn sensor2_type(&self) -> Option<&'static str> {
        if !self.sensor2_available {
            return None;
        }
        if self.sensor2_type_code == Some(SENSOR_TYPE_TEMPERATURE) {
            Some("Temp")
        } else {
            Some("Humi")
        }
    }

    /// Fraction of storage in use, if the capacity is known.
    pub fn storage_used(&self) -> Option<f64> {
        (self.capacity > 0).then(|| self.record_count as f64 / self.capacity as f64)
    }
}

/// Temperature unit shown by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TempUnit {
    #[default]
    C,
    F,
}

impl TempUnit {
    /// Convert a value in this unit to Celsius.
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            TempUnit::C => value,
            TempUnit::F => (value - 32.0) * 5.0 / 9.0,
        }
    }
}

/// Writable logger configuration.
///
/// Limits are held in Celsius regardless of the display unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub description: String,
    pub temp_unit: TempUnit,
    pub interval_secs: u32,
    pub start_delay_minutes: u32,
    pub button_stop: bool,
    pub key_tone: bool,
    pub alarm_tone_beeps: u8,
    pub alarm_tone_interval_minutes: u32,
    pub storage_loop: bool,
    pub display_time_secs: u32,
    pub shortened_interval_minutes: u32,
    pub device_address: u8,
    pub temp_upper_limit: f64,
    pub temp_lower_limit: f64,
    pub temp_calibration: f64,
    pub humidity_upper_limit: f64,
    pub humidity_lower_limit: f64,
    pub humidity_calibration: f64,
}

/// Optional features and alarm ranges supported by the logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub storage_loop: bool,
    pub shortened_interval: bool,
    pub display_time: bool,
    pub alarm_tone_interval: bool,
    pub alarm_min_temp: f64,
    pub alarm_max_temp: f64,
    pub alarm_min_humidity: f64,
    pub alarm_max_humidity: f64,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            storage_loop: false,
            shortened_interval: false,
            display_time: false,
            alarm_tone_interval: false,
            alarm_min_temp: -40.0,
            alarm_max_temp: 85.0,
            alarm_min_humidity: 0.0,
            alarm_max_humidity: 100.0,
        }
    }
}
