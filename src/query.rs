//! snapshot query accessor.
//!
//! turns the stored snapshot into what consumers see. staleness is judged per
//! query from the clock and never written back.

use std::sync::Arc;

use crate::clock::Clock;
use crate::domain::{ReadingView, SensorStatus, Snapshot};
use crate::store::ReadingStore;

#[derive(Clone)]
pub struct ReadingQuery {
    store: Arc<dyn ReadingStore>,
    clock: Arc<dyn Clock>,
    stale_after_seconds: i64,
}

impl ReadingQuery {
    pub fn new(store: Arc<dyn ReadingStore>, clock: Arc<dyn Clock>, stale_after_seconds: i64) -> Self {
        Self { store, clock, stale_after_seconds }
    }

    pub fn query(&self) -> ReadingView {
        let snapshot = self.store.read();
        view_at(snapshot, self.clock.now_unix(), self.stale_after_seconds)
    }

    pub fn now_unix(&self) -> i64 {
        self.clock.now_unix()
    }
}

/// stored status, overridden to `Stale` once the reading is older than the limit
pub fn view_at(snapshot: Snapshot, now_unix: i64, stale_after_seconds: i64) -> ReadingView {
    let mut view = ReadingView::from_snapshot(snapshot);
    if let Some(ts) = view.timestamp {
        if now_unix - ts > stale_after_seconds {
            view.status = SensorStatus::Stale;
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::Reading;
    use crate::store::SharedReadingStore;

    const STALE_AFTER: i64 = 3 * 60;

    fn setup(now: i64) -> (Arc<SharedReadingStore>, Arc<FixedClock>, ReadingQuery) {
        let store = Arc::new(SharedReadingStore::new());
        let clock = Arc::new(FixedClock::at(now));
        let query = ReadingQuery::new(store.clone(), clock.clone(), STALE_AFTER);
        (store, clock, query)
    }

    #[test]
    fn never_measured_reports_starting() {
        let (_, clock, query) = setup(1000);
        let expected = ReadingView { temperature: None, humidity: None, timestamp: None, status: SensorStatus::Starting };
        assert_eq!(query.query(), expected);
        // no timestamp, so no amount of time makes it stale
        clock.set(1_000_000);
        assert_eq!(query.query(), expected);
    }

    #[test]
    fn fresh_then_stale() {
        let (store, clock, query) = setup(1010);
        store.write(Reading::accept(21.3, 55.2, 1000).unwrap(), SensorStatus::Ok);

        let fresh = query.query();
        assert_eq!(
            fresh,
            ReadingView { temperature: Some(21.3), humidity: Some(55.2), timestamp: Some(1000), status: SensorStatus::Ok }
        );

        clock.set(1300);
        let stale = query.query();
        assert_eq!(stale, ReadingView { status: SensorStatus::Stale, ..fresh });

        // derived only: the store still says ok
        assert_eq!(store.read().status, SensorStatus::Ok);
    }

    #[test]
    fn staleness_boundary_is_strict() {
        let snap = Snapshot { reading: Some(Reading::accept(20.0, 50.0, 1000).unwrap()), status: SensorStatus::Ok };
        assert_eq!(view_at(snap, 1000 + STALE_AFTER, STALE_AFTER).status, SensorStatus::Ok);
        assert_eq!(view_at(snap, 1000 + STALE_AFTER + 1, STALE_AFTER).status, SensorStatus::Stale);
    }

    #[test]
    fn stale_overrides_error() {
        let (store, clock, query) = setup(1000);
        store.write(Reading::accept(20.0, 50.0, 1000).unwrap(), SensorStatus::Ok);
        store.set_status(SensorStatus::Error);

        assert_eq!(query.query().status, SensorStatus::Error);
        clock.set(1000 + STALE_AFTER + 1);
        let view = query.query();
        assert_eq!(view.status, SensorStatus::Stale);
        assert_eq!(view.temperature, Some(20.0));
    }

    #[test]
    fn repeated_queries_are_identical() {
        let (store, _, query) = setup(1050);
        store.write(Reading::accept(19.9, 61.0, 1000).unwrap(), SensorStatus::Ok);
        assert_eq!(query.query(), query.query());
    }
}
