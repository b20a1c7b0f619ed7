//! ==============================================================================
//! sampler.rs - background sampling loop
//! ==============================================================================
//!
//! purpose:
//!     owns the sensor capability and, forever: trigger, wait the settle delay,
//!     read, validate, publish, wait the reading interval.
//!
//! failure handling:
//!     a failed or implausible cycle never ends the loop. the stored reading is
//!     left alone, the status becomes `Error`, and the next cycle runs on
//!     schedule. there is no retry within a cycle.
//!
//! blocking:
//!     capability calls go through `spawn_blocking` so driver i/o never stalls
//!     the runtime. nothing bounds how long they take: a driver that never
//!     returns stalls this loop (and only this loop; queries keep answering
//!     from the store, eventually as stale).
//!
//! relationships:
//!     - owns: hal.rs `SensorCapability`
//!     - writes: store.rs (sole writer)
//!     - stamps readings with: clock.rs
//!
//! ==============================================================================

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::domain::{Reading, SensorStatus};
use crate::error::{Result, SensorError};
use crate::hal::SensorCapability;
use crate::store::ReadingStore;

pub struct Sampler<S> {
    // only ever locked from inside a blocking task, one call at a time
    sensor: Arc<Mutex<S>>,
    store: Arc<dyn ReadingStore>,
    clock: Arc<dyn Clock>,
    settle_delay: Duration,
    interval: Duration,
    show_data: bool,
}

impl<S: SensorCapability + 'static> Sampler<S> {
    pub fn new(
        sensor: S,
        store: Arc<dyn ReadingStore>,
        clock: Arc<dyn Clock>,
        settle_delay: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            sensor: Arc::new(Mutex::new(sensor)),
            store,
            clock,
            settle_delay,
            interval,
            show_data: true,
        }
    }

    /// log accepted values at info (true) or debug (false)
    pub fn show_data(mut self, show: bool) -> Self {
        self.show_data = show;
        self
    }

    /// run until the task is dropped
    pub async fn run(self) {
        info!(interval_s = self.interval.as_secs(), "[SAMPLER] Starting DHT22 sampling");
        loop {
            // the outcome is already in the store and the log
            let _ = self.cycle().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// one trigger/settle/read/publish pass
    pub async fn cycle(&self) -> Result<Reading> {
        match self.measure().await {
            Ok(reading) => {
                self.store.write(reading, SensorStatus::Ok);
                if self.show_data {
                    info!(
                        "[DHT22] Temp: {:.1}°C | Humidity: {:.1}%",
                        reading.temperature_celsius(),
                        reading.humidity_percent()
                    );
                } else {
                    debug!(
                        temperature = reading.temperature_celsius(),
                        humidity = reading.humidity_percent(),
                        "reading stored"
                    );
                }
                Ok(reading)
            }
            Err(e) => {
                self.store.set_status(SensorStatus::Error);
                warn!("[DHT22] ⚠ {}", e);
                Err(e)
            }
        }
    }

    async fn measure(&self) -> Result<Reading> {
        self.with_sensor(|s| s.trigger()).await?;
        tokio::time::sleep(self.settle_delay).await;
        let (temperature, humidity) =
            self.with_sensor(|s| Ok((s.temperature()?, s.humidity()?))).await?;
        Reading::accept(temperature, humidity, self.clock.now_unix())
    }

    /// run a capability call on the blocking pool
    async fn with_sensor<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> Result<T> + Send + 'static,
    {
        let sensor = self.sensor.clone();
        tokio::task::spawn_blocking(move || {
            let mut sensor = sensor.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut *sensor)
        })
        .await
        .map_err(|e| SensorError::ReadFailure(format!("task join error: {}", e)))?
    }
}
