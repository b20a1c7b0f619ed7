//! ==============================================================================
//! main.rs - dht22 host entry point
//! ==============================================================================
//!
//! purpose:
//!     samples one dht22 temperature/humidity sensor on a gpio pin, keeps the
//!     latest reading in memory, and serves it as json to other processes
//!     (the thermostat controller, a dashboard, curl).
//!
//! responsibilities:
//!     - load configuration and initialize logging
//!     - acquire the sensor (fatal if the driver is missing)
//!     - run the sampling loop in the background
//!     - serve the reading and health endpoints
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │                     rust host (this file)                    │
//!     │  ┌─────────────┐    ┌──────────────┐    ┌────────────────┐   │
//!     │  │  sampler    │───▶│ shared store │◀───│  query + http  │   │
//!     │  │ (60s cycle) │    │   (mutex)    │    │  (port 5000)   │   │
//!     │  └──────┬──────┘    └──────────────┘    └────────────────┘   │
//!     │         │ trigger / read (blocking pool)                      │
//!     └─────────┼────────────────────────────────────────────────────┘
//!               ▼
//!         ┌─────────────┐
//!         │ dht22 (hal) │  mock by default, rppal + adafruit_dht with
//!         └─────────────┘  --features hardware
//!
//! startup order:
//!     config → logging → sensor → sampler → grace period → http.
//!     the first queries may still report "starting": the grace period does
//!     not wait for a successful cycle.
//!
//! ==============================================================================

mod clock;
mod config;
mod domain;
mod error;
mod gpio;
mod hal;
mod query;
mod sampler;
mod server;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::clock::{Clock, SystemClock};
use crate::store::{ReadingStore, SharedReadingStore};

#[tokio::main]
async fn main() -> Result<()> {
    // step 1: load configuration
    let (config, source) = config::HostConfig::discover()?;

    // step 2: logging - RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid logging.level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("===========================================================");
    tracing::info!("  DHT22 Host - {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("===========================================================");
    match &source {
        Some(path) => tracing::info!("[CONFIG] Loaded from {}", path.display()),
        None => tracing::warn!("[CONFIG] No config file found - using defaults"),
    }
    config.log_summary();

    // step 3: acquire the sensor; without it there is nothing to serve
    let sensor = acquire_sensor(config.sensor.gpio_pin, hal::Dht22::open)?;

    // step 4: shared state, injected into both sides
    let store: Arc<dyn ReadingStore> = Arc::new(SharedReadingStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // step 5: sampler in background
    let sampler = sampler::Sampler::new(
        sensor,
        store.clone(),
        clock.clone(),
        config.settle_delay(),
        config.reading_interval(),
    )
    .show_data(config.logging.show_sensor_data);
    tokio::spawn(sampler.run());

    // step 6: give the first cycle a head start, then serve
    tokio::time::sleep(config.startup_grace()).await;

    let query = query::ReadingQuery::new(store, clock, config.stale_after_seconds());
    server::serve(&config.bind_addr(), query).await
}

/// open the sensor or fail startup; `main` returning the error exits non-zero
fn acquire_sensor<S>(pin: u8, open: impl FnOnce(u8) -> error::Result<S>) -> Result<S> {
    match open(pin) {
        Ok(sensor) => {
            tracing::info!("[STARTUP] ✓ DHT22 ready on GPIO{}", pin);
            Ok(sensor)
        }
        Err(e) => {
            tracing::error!("[ERROR] Fatal: {}", e);
            Err(e).context("failed to initialize the sensor driver")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;

    #[test]
    fn missing_driver_fails_startup() {
        let result: Result<()> = acquire_sensor(4, |_| {
            Err(SensorError::DriverUnavailable("adafruit_dht not importable".into()))
        });
        let err = result.unwrap_err();

        assert_eq!(
            err.downcast_ref::<SensorError>(),
            Some(&SensorError::DriverUnavailable("adafruit_dht not importable".into()))
        );
        let chain = format!("{:#}", err);
        assert!(chain.contains("failed to initialize the sensor driver"), "{chain}");
        assert!(chain.contains("adafruit_dht not importable"), "{chain}");
    }

    #[test]
    fn opener_gets_configured_pin() {
        let pin = acquire_sensor(17, |pin| Ok(pin)).unwrap();
        assert_eq!(pin, 17);
    }
}
