//! Event dispatch: walks the sorted event stream and applies every event
//! whose time has been reached to the owning driver's state.

use super::driver::{DriverState, SessionBests};
use crate::error::{ReplayError, Result};
use crate::event::RaceEvent;
use crate::time::Timestamp;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Race-wide rules applied while dispatching.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchRules {
    /// How long a position change stays marked.
    pub overtake_window: Timestamp,
    pub total_laps: u32,
    /// Silence after which an on-track driver is classified DNF.
    pub retirement_threshold: Timestamp,
    /// Official classification per driver, used for finishers.
    pub final_status: FxHashMap<String, String>,
}

impl DispatchRules {
    pub fn new(total_laps: u32, overtake_window: Timestamp, retirement_threshold: Timestamp) -> Self {
        Self {
            overtake_window,
            total_laps,
            retirement_threshold,
            final_status: FxHashMap::default(),
        }
    }

    pub fn with_final_status(mut self, final_status: FxHashMap<String, String>) -> Self {
        self.final_status = final_status;
        self
    }
}

/// Drains due events into per-driver state.
///
/// Applied events cannot be undone one by one (pit counts, session bests),
/// so moving backwards means [`EventDispatcher::rewind`] to the grid and
/// replaying forward.
///
/// Finish and retirement are settled before every applied event and again at
/// the target time, so driver state at a race time does not depend on how
/// often `advance` was called to get there.
#[derive(Clone, Debug)]
pub struct EventDispatcher {
    events: Arc<[RaceEvent]>,
    /// Starting grid, in grid order.
    grid: IndexMap<String, DriverState>,
    drivers: IndexMap<String, DriverState>,
    bests: SessionBests,
    next_index: usize,
    rules: DispatchRules,
}

impl EventDispatcher {
    /// Create a dispatcher over a time-sorted event stream.
    pub fn new(
        events: impl Into<Arc<[RaceEvent]>>,
        grid: IndexMap<String, DriverState>,
        rules: DispatchRules,
    ) -> Self {
        Self {
            events: events.into(),
            drivers: grid.clone(),
            grid,
            bests: SessionBests::default(),
            next_index: 0,
            rules,
        }
    }

    /// Apply every unconsumed event with `time <= until`, in stream order,
    /// then settle drivers at `until`.
    ///
    /// Returns the index of the first unconsumed event.
    pub fn advance(&mut self, until: Timestamp) -> Result<usize> {
        let events = Arc::clone(&self.events);
        while let Some(event) = events.get(self.next_index) {
            if event.time > until {
                break;
            }
            if !self.drivers.contains_key(&event.driver) {
                return Err(ReplayError::MissingDriverState {
                    driver: event.driver.clone(),
                    race_time: until,
                    next_index: self.next_index,
                });
            }
            self.settle(event.time);

            if let Some(state) = self.drivers.get_mut(&event.driver) {
                state.apply_in_place(event, self.rules.overtake_window);
            }
            if self.bests.observe(event) {
                tracing::trace!(driver = %event.driver, kind = %event.event_type, "new session best");
            }
            tracing::trace!(
                index = self.next_index,
                driver = %event.driver,
                lap = event.lap_number,
                kind = %event.event_type,
                "applied event"
            );
            self.next_index += 1;
        }
        self.settle(until);
        Ok(self.next_index)
    }

    /// Classify every on-track driver who has finished or gone silent by `now`.
    fn settle(&mut self, now: Timestamp) {
        let rules = &self.rules;
        for state in self.drivers.values_mut() {
            let final_status = rules.final_status.get(&state.driver).map(String::as_str);
            if state.settle(now, rules.total_laps, final_status, rules.retirement_threshold) {
                tracing::info!(
                    driver = %state.driver,
                    status = state.status.label(),
                    race_time = %now,
                    "driver classified"
                );
            }
        }
    }

    /// Reset to the starting grid: index zero, every driver and every
    /// session-wide tracker back to initial values.
    pub fn rewind(&mut self) {
        tracing::debug!(from_index = self.next_index, "rewinding event stream");
        self.drivers.clone_from(&self.grid);
        self.bests = SessionBests::default();
        self.next_index = 0;
    }

    /// Rewind and replay up to `until`.
    pub fn seek(&mut self, until: Timestamp) -> Result<usize> {
        self.rewind();
        self.advance(until)
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// True once every event has been applied.
    pub fn is_drained(&self) -> bool {
        self.next_index >= self.events.len()
    }

    pub fn events(&self) -> &[RaceEvent] {
        &self.events
    }

    pub fn rules(&self) -> &DispatchRules {
        &self.rules
    }

    /// Current driver states, in grid order.
    pub fn drivers(&self) -> &IndexMap<String, DriverState> {
        &self.drivers
    }

    pub fn driver(&self, driver: &str) -> Option<&DriverState> {
        self.drivers.get(driver)
    }

    pub fn session_bests(&self) -> SessionBests {
        self.bests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn secs(s: u64) -> Timestamp {
        Timestamp::from_secs(s)
    }

    fn grid() -> IndexMap<String, DriverState> {
        ["NOR", "PIA"]
            .iter()
            .enumerate()
            .map(|(i, d)| (d.to_string(), DriverState::on_grid(*d, i as u32 + 1, None)))
            .collect()
    }

    fn dispatcher() -> EventDispatcher {
        let events = vec![
            RaceEvent::new(secs(10), "NOR", 1, 1, EventKind::Sector1).with_sector_time(secs(10)),
            RaceEvent::new(secs(12), "PIA", 1, 2, EventKind::Sector1).with_sector_time(secs(12)),
            RaceEvent::new(secs(12), "PIA", 1, 2, EventKind::PitIn),
            RaceEvent::new(secs(20), "NOR", 1, 1, EventKind::Sector2).with_sector_time(secs(10)),
            RaceEvent::new(secs(40), "PIA", 2, 2, EventKind::PitOut),
        ];
        EventDispatcher::new(events, grid(), rules())
    }

    fn rules() -> DispatchRules {
        DispatchRules::new(2, secs(4), secs(120))
    }

    #[test]
    fn test_advance_is_inclusive_and_monotonic() {
        let mut d = dispatcher();
        assert_eq!(d.advance(secs(9)).unwrap(), 0);
        assert_eq!(d.advance(secs(10)).unwrap(), 1);
        assert_eq!(d.advance(secs(12)).unwrap(), 3);
        // Going back in time without a rewind applies nothing.
        assert_eq!(d.advance(secs(5)).unwrap(), 3);
        assert_eq!(d.driver("PIA").unwrap().display_status.to_string(), "IN PIT");
        assert!(!d.is_drained());
        d.advance(secs(100)).unwrap();
        assert!(d.is_drained());
        assert_eq!(d.driver("PIA").unwrap().pit_stops, 1);
    }

    #[test]
    fn test_same_timestamp_applies_in_stream_order() {
        let mut d = dispatcher();
        d.advance(secs(12)).unwrap();
        let pia = d.driver("PIA").unwrap();
        assert_eq!(pia.last_event_type, Some(EventKind::PitIn));
        assert_eq!(pia.s1, Some(secs(12)));
    }

    #[test]
    fn test_rewind_resets_everything() {
        let mut d = dispatcher();
        d.advance(secs(100)).unwrap();
        assert_eq!(d.session_bests().s1, Some(secs(10)));

        d.rewind();
        assert_eq!(d.next_index(), 0);
        assert_eq!(d.session_bests(), SessionBests::default());
        assert_eq!(d.driver("PIA").unwrap().pit_stops, 0);
        assert_eq!(d.drivers(), &grid());
    }

    #[test]
    fn test_seek_matches_straight_run() {
        let mut straight = dispatcher();
        straight.advance(secs(20)).unwrap();

        let mut seeked = dispatcher();
        seeked.advance(secs(100)).unwrap();
        seeked.seek(secs(20)).unwrap();

        assert_eq!(straight.drivers(), seeked.drivers());
        assert_eq!(straight.session_bests(), seeked.session_bests());
        assert_eq!(straight.next_index(), seeked.next_index());
    }

    #[test]
    fn test_unknown_driver_is_an_error() {
        let events = vec![RaceEvent::new(secs(1), "XXX", 1, 1, EventKind::Sector1)];
        let mut d = EventDispatcher::new(events, grid(), rules());
        let err = d.advance(secs(5)).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::MissingDriverState { next_index: 0, .. }
        ));
    }

    #[test]
    fn test_retirement_is_settled_between_calls() {
        // PIA is silent from 0s to 130s, then resumes.
        let mut events = vec![RaceEvent::new(secs(0), "PIA", 1, 2, EventKind::Sector1)];
        for t in (0..=150).step_by(10) {
            events.push(RaceEvent::new(secs(t), "NOR", 1, 1, EventKind::Sector1));
        }
        events.push(RaceEvent::new(secs(130), "PIA", 1, 2, EventKind::Sector2));
        events.sort_by_key(|e| e.time);

        let mut stepped = EventDispatcher::new(events.clone(), grid(), rules());
        for t in 0..=150 {
            stepped.advance(secs(t)).unwrap();
        }
        let mut single = EventDispatcher::new(events, grid(), rules());
        single.advance(secs(150)).unwrap();

        assert_eq!(stepped.driver("PIA").unwrap().status.label(), "DNF");
        assert_eq!(stepped.drivers(), single.drivers());
        assert!(stepped.driver("NOR").unwrap().status.is_on_track());
    }

    #[test]
    fn test_finisher_takes_official_status() {
        let mut final_status = FxHashMap::default();
        final_status.insert("NOR".to_string(), "Finished".to_string());
        let mut lapped = RaceEvent::new(secs(95), "PIA", 2, 2, EventKind::Lap);
        lapped.final_status = Some("+1 Lap".to_string());
        let events = vec![
            RaceEvent::new(secs(90), "NOR", 2, 1, EventKind::Lap),
            lapped,
        ];
        let mut d = EventDispatcher::new(events, grid(), rules().with_final_status(final_status));
        d.advance(secs(95)).unwrap();
        assert_eq!(d.driver("NOR").unwrap().status.label(), "Finished");
        assert_eq!(d.driver("PIA").unwrap().status.label(), "+1 Lap");
    }
}
