//! ==============================================================================
//! gpio.rs - dht22 measurement via the python driver
//! ==============================================================================
//!
//! purpose:
//!     runs one dht22 measurement on a gpio pin and parses the result.
//!
//! why subprocess to python?:
//!     dht22 sensors require precise bit-banging timing (~microseconds).
//!     pure rust in userspace is unreliable due to lack of real-time guarantees.
//!     adafruit_dht handles this correctly with timing compensation.
//!
//! relationships:
//!     - used by: hal.rs (hardware `Dht22` spawns in trigger, collects in reads)
//!     - uses: python3/adafruit_dht
//!
//! note:
//!     `collect` waits on the child with no timeout. a driver that never
//!     exits stalls the sampler.
//!
//! ==============================================================================

// only the hardware build drives a real pin
#![cfg_attr(not(feature = "hardware"), allow(dead_code))]

use std::process::{Child, Command, Stdio};

use crate::error::{Result, SensorError};

/// imports the driver without touching the pin
pub const DRIVER_IMPORT: &str = "import adafruit_dht, board";

fn measurement_script(pin: u8) -> String {
    format!(
        r#"
import sys
try:
    import adafruit_dht
    import board
    import json

    # create dht22 sensor on specified pin
    dht = adafruit_dht.DHT22(board.D{})

    try:
        t, h = dht.temperature, dht.humidity
        if t is not None and h is not None:
            print(json.dumps({{"t": t, "h": h}}))
        else:
            print("null")
    finally:
        dht.exit()
except Exception as e:
    # Print ONLY the error message to stderr (no traceback with paths)
    print(str(e), file=sys.stderr)
    sys.exit(1)
"#,
        pin
    )
}

/// check that python3 can import the dht driver
pub fn check_driver() -> Result<()> {
    check_driver_with("python3")
}

fn check_driver_with(interpreter: &str) -> Result<()> {
    let output = Command::new(interpreter)
        .args(["-c", DRIVER_IMPORT])
        .output()
        .map_err(|e| SensorError::DriverUnavailable(format!("failed to run {}: {}", interpreter, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SensorError::DriverUnavailable(format!(
            "adafruit_dht not importable: {}",
            stderr.trim()
        )));
    }
    Ok(())
}

/// start a measurement; returns immediately
pub fn spawn_measurement(pin: u8) -> Result<Child> {
    Command::new("python3")
        .arg("-c")
        .arg(measurement_script(pin))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SensorError::ReadFailure(format!("failed to run python3: {}", e)))
}

/// wait for a spawned measurement and parse its output
pub fn collect(child: Child) -> Result<(f64, f64)> {
    let output = child
        .wait_with_output()
        .map_err(|e| SensorError::ReadFailure(format!("measurement process: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SensorError::ReadFailure(format!("python error: {}", stderr.trim())));
    }

    parse_output(&String::from_utf8_lossy(&output.stdout))
}

/// parse the `{"t": .., "h": ..}` line printed by the measurement script
pub fn parse_output(stdout: &str) -> Result<(f64, f64)> {
    let stdout = stdout.trim();
    if stdout == "null" || stdout.is_empty() {
        return Err(SensorError::ReadFailure("sensor returned null".into()));
    }

    let parsed: serde_json::Value = serde_json::from_str(stdout)
        .map_err(|e| SensorError::ReadFailure(format!("json parse error: {} (got: {})", e, stdout)))?;

    let temp = parsed["t"]
        .as_f64()
        .ok_or_else(|| SensorError::ReadFailure("missing temperature".into()))?;
    let humidity = parsed["h"]
        .as_f64()
        .ok_or_else(|| SensorError::ReadFailure("missing humidity".into()))?;

    Ok((temp, humidity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_driver_output() {
        assert_eq!(parse_output("{\"t\": 21.3, \"h\": 55.2}\n").unwrap(), (21.3, 55.2));
    }

    #[test]
    fn null_output_is_read_failure() {
        assert_eq!(
            parse_output("null\n").unwrap_err(),
            SensorError::ReadFailure("sensor returned null".into())
        );
        assert!(parse_output("").is_err());
    }

    #[test]
    fn garbage_and_missing_fields_fail() {
        assert!(parse_output("Checksum did not validate").is_err());
        assert_eq!(
            parse_output("{\"t\": 21.3}").unwrap_err(),
            SensorError::ReadFailure("missing humidity".into())
        );
    }

    #[test]
    fn missing_interpreter_is_driver_unavailable() {
        let err = check_driver_with("python3-not-installed").unwrap_err();
        match err {
            SensorError::DriverUnavailable(msg) => assert!(msg.contains("python3-not-installed"), "{msg}"),
            other => panic!("expected DriverUnavailable, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failing_import_is_driver_unavailable() {
        // `false` ignores its arguments and exits 1, like a failed import
        let err = check_driver_with("false").unwrap_err();
        assert!(
            matches!(&err, SensorError::DriverUnavailable(msg) if msg.starts_with("adafruit_dht not importable")),
            "{err:?}"
        );
    }

    #[test]
    fn script_targets_pin() {
        assert!(measurement_script(17).contains("board.D17"));
    }

    // note: hardware tests require an actual pi and are not run in ci
    // #[test]
    // fn test_dht22() {
    //     let child = spawn_measurement(4).unwrap();
    //     println!("dht22 result: {:?}", collect(child));
    // }
}
