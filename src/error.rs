//! Error types for the sensor side of the host.
//!
//! Only `DriverUnavailable` is fatal, and only at startup. Everything that can go
//! wrong inside a sampling cycle is recorded as `SensorStatus::Error` and the loop
//! carries on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SensorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("sensor driver unavailable: {0}")]
    DriverUnavailable(String),

    #[error("sensor read failed: {0}")]
    ReadFailure(String),

    #[error("implausible reading: {temperature}°C, {humidity}%")]
    ImplausibleReading { temperature: f64, humidity: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_unavailable_carries_diagnostic() {
        let err = SensorError::DriverUnavailable("no /dev/gpiomem".into());
        assert_eq!(err.to_string(), "sensor driver unavailable: no /dev/gpiomem");
    }

    #[test]
    fn implausible_message_names_values() {
        let err = SensorError::ImplausibleReading { temperature: 90.0, humidity: 40.5 };
        assert_eq!(err.to_string(), "implausible reading: 90°C, 40.5%");
    }
}
