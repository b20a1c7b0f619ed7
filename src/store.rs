//! ==============================================================================
//! store.rs - shared reading store
//! ==============================================================================
//!
//! purpose:
//!     the one piece of mutable state shared between the sampler (sole writer)
//!     and every http request (readers).
//!
//! locking:
//!     a single std mutex guards the whole cell. the critical sections are a
//!     copy of a small `Copy` struct, so nothing ever holds the lock across an
//!     await, the settle delay, or sensor i/o. a reader therefore sees the cell
//!     either before or after a write, never half of one.
//!
//! relationships:
//!     - written by: sampler.rs
//!     - read by: query.rs
//!
//! ==============================================================================

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{Reading, SensorStatus, Snapshot};

/// access to the latest reading, behind a trait so both sides can be tested
/// against a fake
pub trait ReadingStore: Send + Sync {
    /// replace reading and status together
    fn write(&self, reading: Reading, status: SensorStatus);
    /// change the status, keep whatever reading is stored
    fn set_status(&self, status: SensorStatus);
    fn read(&self) -> Snapshot;
}

/// process-wide cell, starts as `(None, Starting)`
#[derive(Debug, Default)]
pub struct SharedReadingStore {
    state: Mutex<Snapshot>,
}

impl SharedReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        // every write is a single assignment, so a poisoned cell is still whole
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReadingStore for SharedReadingStore {
    fn write(&self, reading: Reading, status: SensorStatus) {
        debug_assert!(
            matches!(status, SensorStatus::Ok | SensorStatus::Error),
            "a stored reading must be ok or error, got {status:?}"
        );
        *self.lock() = Snapshot { reading: Some(reading), status };
    }

    fn set_status(&self, status: SensorStatus) {
        debug_assert_ne!(status, SensorStatus::Stale, "stale is derived, never stored");
        let mut state = self.lock();
        debug_assert!(
            status != SensorStatus::Ok || state.reading.is_some(),
            "ok status without a reading"
        );
        state.status = status;
    }

    fn read(&self) -> Snapshot {
        *self.lock()
    }
}
