//! ==============================================================================
//! hal.rs - sensor capability
//! ==============================================================================
//!
//! purpose:
//!     the trigger/read interface the sampler drives, plus the `Dht22` that
//!     implements it. abstracts away the difference between running on a real
//!     Raspberry Pi and a development machine (using a mock).
//!
//! design philosophy:
//!     - "Compile Anywhere": the host builds on Windows/Mac/Linux by default.
//!     - the real driver only exists with `--features hardware`.
//!
//! relationships:
//!     - used by: sampler.rs (owns the capability), main.rs (opens it)
//!     - uses: rppal (on feature="hardware"), gpio.rs (python driver)
//!
//! ==============================================================================

use crate::error::Result;

/// trigger a measurement, then read the two halves of it
///
/// calls may block; the sampler runs them on the blocking pool. `temperature`
/// and `humidity` are only meaningful after `trigger` plus the settle delay.
pub trait SensorCapability: Send {
    fn trigger(&mut self) -> Result<()>;
    fn temperature(&mut self) -> Result<f64>;
    fn humidity(&mut self) -> Result<f64>;
}

// ==============================================================================================
// MOCK IMPLEMENTATION (For WSL / Non-Hardware Build)
// ==============================================================================================
#[cfg(not(feature = "hardware"))]
pub struct Dht22 {
    pin: u8,
    cycle: u32,
}

#[cfg(not(feature = "hardware"))]
impl Dht22 {
    pub fn open(pin: u8) -> Result<Self> {
        // served readings are fake: make a misbuilt deployment obvious in the logs
        tracing::warn!(pin, "Using MOCK DHT22 (No hardware access, built without --features hardware)");
        Ok(Self { pin, cycle: 0 })
    }
}

#[cfg(not(feature = "hardware"))]
impl SensorCapability for Dht22 {
    fn trigger(&mut self) -> Result<()> {
        self.cycle = self.cycle.wrapping_add(1);
        tracing::debug!("[MOCK DHT22] Trigger on pin {}", self.pin);
        Ok(())
    }

    fn temperature(&mut self) -> Result<f64> {
        // drifts between 21.0 and 21.9 so consecutive readings differ
        Ok(21.0 + f64::from(self.cycle % 10) / 10.0)
    }

    fn humidity(&mut self) -> Result<f64> {
        Ok(48.0)
    }
}

// ==============================================================================================
// REAL IMPLEMENTATION (For Raspberry Pi)
// ==============================================================================================
#[cfg(feature = "hardware")]
pub struct Dht22 {
    pin: u8,
    pending: Option<std::process::Child>,
    measurement: Option<(f64, f64)>,
}

#[cfg(feature = "hardware")]
impl Dht22 {
    /// check pin access and the python driver
    ///
    /// failure here is `DriverUnavailable`; the host refuses to start.
    pub fn open(pin: u8) -> Result<Self> {
        use crate::error::SensorError;
        use rppal::gpio::Gpio;

        let gpio = Gpio::new().map_err(|e| SensorError::DriverUnavailable(format!("gpio: {}", e)))?;
        // the pin handle is released again; the python driver claims it per measurement
        gpio.get(pin)
            .map_err(|e| SensorError::DriverUnavailable(format!("gpio pin {}: {}", pin, e)))?;
        crate::gpio::check_driver()?;

        tracing::info!(pin, "Using REAL DHT22 (rppal + adafruit_dht)");
        Ok(Self { pin, pending: None, measurement: None })
    }

    fn measurement(&mut self) -> Result<(f64, f64)> {
        if let Some(m) = self.measurement {
            return Ok(m);
        }
        let child = self.pending.take().ok_or_else(|| {
            crate::error::SensorError::ReadFailure("read before trigger".into())
        })?;
        let m = crate::gpio::collect(child)?;
        self.measurement = Some(m);
        Ok(m)
    }
}

#[cfg(feature = "hardware")]
impl SensorCapability for Dht22 {
    fn trigger(&mut self) -> Result<()> {
        if let Some(mut stale) = self.pending.take() {
            // a previous cycle failed before collecting; don't leave it running
            let _ = stale.kill();
            let _ = stale.wait();
        }
        self.measurement = None;
        self.pending = Some(crate::gpio::spawn_measurement(self.pin)?);
        Ok(())
    }

    fn temperature(&mut self) -> Result<f64> {
        self.measurement().map(|(t, _)| t)
    }

    fn humidity(&mut self) -> Result<f64> {
        self.measurement().map(|(_, h)| h)
    }
}
