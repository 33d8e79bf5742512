//! Device configuration changes requested by the user.

use std::time::Duration;

use elitechlog_transport::{Parameters, TempUnit, TransportKind, WORK_MODE_STOPPED};

use crate::error::ValidationError;

/// Smallest gap allowed between a lower and an upper alarm limit.
const MIN_LIMIT_GAP: f64 = 0.5;

/// USB loggers cannot switch the display off; this is their shortest timeout.
const USB_MIN_DISPLAY_SECS: u32 = 15;

const MAX_DESCRIPTION_LEN: usize = 100;

/// A set of optional configuration changes.
///
/// Temperature limits are given in the device's display unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChange {
    pub description: Option<String>,
    pub temp_unit: Option<TempUnit>,
    pub interval: Option<Duration>,
    pub start_delay: Option<Duration>,
    pub button_stop: Option<bool>,
    pub device_address: Option<u8>,
    pub key_tone: Option<bool>,
    pub alarm_tone_beeps: Option<u8>,
    pub alarm_tone_interval: Option<Duration>,
    pub storage_loop: Option<bool>,
    pub display_time: Option<Duration>,
    pub shortened_interval: Option<Duration>,
    pub temp_upper_limit: Option<f64>,
    pub temp_lower_limit: Option<f64>,
    pub temp_calibration: Option<f64>,
    pub humidity_upper_limit: Option<f64>,
    pub humidity_lower_limit: Option<f64>,
    pub humidity_calibration: Option<f64>,
}

fn check(
    value: Option<f64>,
    min: f64,
    max: f64,
    field: &'static str,
    expected: &'static str,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(ValidationError::OutOfRange { field, expected }),
        _ => Ok(()),
    }
}

impl SettingsChange {
    /// Check each value on its own, before any device is involved.
    pub fn check_ranges(&self) -> Result<(), ValidationError> {
        if let Some(delay) = self.start_delay {
            if delay >= Duration::from_secs(16 * 3600) {
                return Err(ValidationError::OutOfRange {
                    field: "Delay time",
                    expected: "between 0 and 16 hours exclusive",
                });
            }
        }
        if let Some(interval) = self.interval {
            if interval < Duration::from_secs(10) || interval > Duration::from_secs(86_400) {
                return Err(ValidationError::OutOfRange {
                    field: "Interval",
                    expected: "between 10 seconds and 1 day",
                });
            }
        }
        if let Some(shortened) = self.shortened_interval {
            if shortened > Duration::from_secs(300) {
                return Err(ValidationError::OutOfRange {
                    field: "Interval shortened",
                    expected: "between 0 and 5 minutes",
                });
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(ValidationError::TooLong {
                    field: "Travel description",
                    max: MAX_DESCRIPTION_LEN,
                });
            }
        }

        const TEMP: &str = "between -273 and 1000";
        check(self.temp_lower_limit, -273.0, 1000.0, "Lower limit temp", TEMP)?;
        check(self.temp_upper_limit, -273.0, 1000.0, "Upper limit temp", TEMP)?;
        check(self.temp_calibration, -10.0, 10.0, "Regulate temp", "between -10 and 10")?;

        const HUMI: &str = "between 0 and 100";
        check(self.humidity_lower_limit, 0.0, 100.0, "Lower limit humi", HUMI)?;
        check(self.humidity_upper_limit, 0.0, 100.0, "Upper limit humi", HUMI)?;
        check(self.humidity_calibration, -20.0, 20.0, "Regulate humi", "between -20 and 20")
    }

    /// Check the change against what the connected device supports.
    pub fn validate(&self, parameters: &Parameters) -> Result<(), ValidationError> {
        let caps = &parameters.capabilities;
        let config = &parameters.config;

        if self.storage_loop.is_some() && !caps.storage_loop {
            return Err(ValidationError::Unavailable("Storage model"));
        }
        if self.shortened_interval.is_some() && !caps.shortened_interval {
            return Err(ValidationError::Unavailable("Interval shortened"));
        }
        if self.display_time.is_some() && !caps.display_time {
            return Err(ValidationError::Unavailable("Display time"));
        }
        if self.alarm_tone_interval.is_some() && !caps.alarm_tone_interval {
            return Err(ValidationError::Unavailable("Alarm tone interval"));
        }

        let unit = self.temp_unit.unwrap_or(config.temp_unit);
        let upper = self.temp_upper_limit.map(|v| unit.to_celsius(v));
        let lower = self.temp_lower_limit.map(|v| unit.to_celsius(v));
        check_limits(
            upper,
            lower,
            config.temp_upper_limit,
            config.temp_lower_limit,
            (caps.alarm_min_temp, caps.alarm_max_temp),
            "temp",
        )?;

        if parameters.status.sensor2_available {
            check_limits(
                self.humidity_upper_limit,
                self.humidity_lower_limit,
                config.humidity_upper_limit,
                config.humidity_lower_limit,
                (caps.alarm_min_humidity, caps.alarm_max_humidity),
                "humi",
            )?;
        } else if self.humidity_lower_limit.is_some() {
            return Err(ValidationError::Unavailable("Lower limit humi"));
        } else if self.humidity_upper_limit.is_some() {
            return Err(ValidationError::Unavailable("Upper limit humi"));
        } else if self.humidity_calibration.is_some() {
            return Err(ValidationError::Unavailable("Regulate humi"));
        }

        Ok(())
    }

    /// Write the change into `parameters`, encoding per transport kind.
    ///
    /// Call [`validate`](Self::validate) first.
    pub fn apply(&self, parameters: &mut Parameters) {
        let kind = parameters.kind;

        // COM loggers reject writes that carry their own serial number.
        if kind == TransportKind::Com {
            parameters.serial_number = Some(String::new());
        }

        let sensor2 = parameters.status.sensor2_available;
        let config = &mut parameters.config;

        if let Some(description) = &self.description {
            config.description = description.trim().to_string();
        }
        if let Some(unit) = self.temp_unit {
            config.temp_unit = unit;
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval.as_secs() as u32;
        }
        if let Some(delay) = self.start_delay {
            // The device counts start delay in half hours.
            config.start_delay_minutes = (delay.as_secs() / 1800 * 30) as u32;
        }
        if let Some(v) = self.button_stop {
            config.button_stop = v;
        }
        if let Some(v) = self.device_address {
            config.device_address = v;
        }
        if let Some(v) = self.key_tone {
            config.key_tone = v;
        }
        if let Some(v) = self.alarm_tone_beeps {
            config.alarm_tone_beeps = v;
        }
        if let Some(v) = self.alarm_tone_interval {
            config.alarm_tone_interval_minutes = (v.as_secs() / 60) as u32;
        }
        if let Some(v) = self.storage_loop {
            config.storage_loop = v;
        }

        if let Some(display) = self.display_time {
            config.display_time_secs = match (display.is_zero(), kind) {
                (true, TransportKind::Com) => 0,
                (true, TransportKind::Usb) => USB_MIN_DISPLAY_SECS,
                (false, _) => display.as_secs() as u32,
            };
        }

        if let Some(shortened) = self.shortened_interval {
            let minutes = (shortened.as_secs() / 60) as u32;
            config.shortened_interval_minutes = match kind {
                // COM loggers only switch the shortened interval on or off.
                TransportKind::Com => u32::from(!shortened.is_zero()),
                TransportKind::Usb => minutes,
            };
        }

        let unit = config.temp_unit;
        if let Some(v) = self.temp_upper_limit {
            config.temp_upper_limit = unit.to_celsius(v);
        }
        if let Some(v) = self.temp_lower_limit {
            config.temp_lower_limit = unit.to_celsius(v);
        }
        if let Some(v) = self.temp_calibration {
            config.temp_calibration = v;
        }

        if sensor2 {
            if let Some(v) = self.humidity_upper_limit {
                config.humidity_upper_limit = v;
            }
            if let Some(v) = self.humidity_lower_limit {
                config.humidity_lower_limit = v;
            }
            if let Some(v) = self.humidity_calibration {
                config.humidity_calibration = v;
            }
        }
    }
}

fn check_limits(
    upper: Option<f64>,
    lower: Option<f64>,
    current_upper: f64,
    current_lower: f64,
    (alarm_min, alarm_max): (f64, f64),
    sensor: &'static str,
) -> Result<(), ValidationError> {
    if let Some(u) = upper {
        if u - lower.unwrap_or(current_lower) < MIN_LIMIT_GAP {
            return Err(ValidationError::LimitOrder { sensor });
        }
    }
    if let Some(l) = lower {
        if upper.unwrap_or(current_upper) - l < MIN_LIMIT_GAP {
            return Err(ValidationError::LimitOrder { sensor });
        }
    }
    let outside = |v: f64| v < alarm_min || v > alarm_max;
    if upper.is_some_and(outside) {
        return Err(ValidationError::OutsideAlarmRange {
            field: if sensor == "temp" { "Upper limit temp" } else { "Upper limit humi" },
            min: alarm_min,
            max: alarm_max,
        });
    }
    if lower.is_some_and(outside) {
        return Err(ValidationError::OutsideAlarmRange {
            field: if sensor == "temp" { "Lower limit temp" } else { "Lower limit humi" },
            min: alarm_min,
            max: alarm_max,
        });
    }
    Ok(())
}

/// Only a logger that has stopped recording can be quick-reset.
pub fn check_resettable(parameters: &Parameters) -> Result<(), ValidationError> {
    if parameters.status.work_mode == WORK_MODE_STOPPED {
        Ok(())
    } else {
        Err(ValidationError::CannotReset)
    }
}
