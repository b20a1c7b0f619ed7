use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};

/// plausible dht22 range, exclusive on both ends
pub const TEMPERATURE_BOUNDS_C: (f64, f64) = (-40.0, 80.0);
pub const HUMIDITY_BOUNDS_PERCENT: (f64, f64) = (0.0, 100.0);

/// a validated measurement, immutable once built
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    temperature_celsius: f64,
    humidity_percent: f64,
    captured_at_unix_seconds: i64,
}

impl Reading {
    /// validate raw driver values and round them to one decimal place
    ///
    /// NaN fails the bounds check like any other out-of-range value.
    pub fn accept(temperature: f64, humidity: f64, captured_at_unix_seconds: i64) -> Result<Self> {
        if !is_plausible(temperature, humidity) {
            return Err(SensorError::ImplausibleReading { temperature, humidity });
        }
        Ok(Self {
            temperature_celsius: round_tenth(temperature),
            humidity_percent: round_tenth(humidity),
            captured_at_unix_seconds,
        })
    }

    pub fn temperature_celsius(&self) -> f64 {
        self.temperature_celsius
    }

    pub fn humidity_percent(&self) -> f64 {
        self.humidity_percent
    }

    pub fn captured_at_unix_seconds(&self) -> i64 {
        self.captured_at_unix_seconds
    }
}

fn is_plausible(temperature: f64, humidity: f64) -> bool {
    let (t_min, t_max) = TEMPERATURE_BOUNDS_C;
    let (h_min, h_max) = HUMIDITY_BOUNDS_PERCENT;
    temperature > t_min && temperature < t_max && humidity > h_min && humidity < h_max
}

/// round to one decimal, half to even, on the exact binary value
///
/// `value * 10.0` can itself round onto or off a tie, so the scaling is done in
/// integers: 21.25 is an exact tie and goes to 21.2, while 22.45 is stored just
/// below the tie and goes to 22.4.
fn round_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let bits = value.to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased_exp == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exp - 1075)
    };
    if exp >= 0 {
        // already an integer
        return value;
    }

    let shift = (-exp) as u32;
    // mantissa * 10 < 2^57, so past 120 bits the result is zero
    if shift > 120 {
        return 0.0f64.copysign(value);
    }
    let scaled = u128::from(mantissa) * 10;
    let tenths = scaled >> shift;
    let remainder = scaled & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);
    let tenths = if remainder > half || (remainder == half && tenths % 2 == 1) {
        tenths + 1
    } else {
        tenths
    };
    (tenths as f64 / 10.0).copysign(value)
}

/// sensor status as reported to consumers
///
/// `Stale` is only ever produced by the query side; the store holds the other three.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Starting,
    Ok,
    Error,
    Stale,
}

/// consistent copy of the shared cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    pub reading: Option<Reading>,
    pub status: SensorStatus,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self { reading: None, status: SensorStatus::Starting }
    }
}

/// json body of `GET /data`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingView {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub timestamp: Option<i64>,
    pub status: SensorStatus,
}

impl ReadingView {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            temperature: snapshot.reading.map(|r| r.temperature_celsius()),
            humidity: snapshot.reading.map(|r| r.humidity_percent()),
            timestamp: snapshot.reading.map(|r| r.captured_at_unix_seconds()),
            status: snapshot.status,
        }
    }
}
