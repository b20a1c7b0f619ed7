//! wall-clock capability.
//!
//! the sampler stamps readings with it and the query side judges staleness with
//! it. tests swap in a fixed clock.

use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// seconds since the unix epoch
    fn now_unix(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        // a clock set before 1970 reads as negative instead of panicking
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        }
    }
}

#[cfg(test)]
pub use fixed::FixedClock;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp() {
        let ts = SystemClock.now_unix();
        // should be after 2024
        assert!(ts > 1_700_000_000, "timestamp should be after 2024");
    }

    #[test]
    fn fixed_clock_moves_only_when_set() {
        let clock = FixedClock::at(1000);
        assert_eq!(clock.now_unix(), 1000);
        clock.set(1300);
        assert_eq!(clock.now_unix(), 1300);
    }
}
