//! Per-driver live state and the event transition that updates it.

use crate::event::{EventKind, RaceEvent};
use crate::time::Timestamp;
use std::fmt;

/// Classification of a driver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DriverStatus {
    /// Still racing.
    OnTrack,
    /// Out of the running: a final result ("Finished", "+1 Lap") or "DNF".
    Classified(String),
}

impl DriverStatus {
    pub fn is_on_track(&self) -> bool {
        matches!(self, DriverStatus::OnTrack)
    }

    pub fn label(&self) -> &str {
        match self {
            DriverStatus::OnTrack => "On Track",
            DriverStatus::Classified(status) => status,
        }
    }
}

/// The short status shown next to a driver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DisplayStatus {
    /// Has not crossed a timing line yet.
    Grid,
    /// Just left the pits.
    Out,
    InPit,
    /// Running normally; shown blank.
    Running,
    /// Final classification.
    Final(String),
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayStatus::Grid => f.write_str("GRID"),
            DisplayStatus::Out => f.write_str("OUT"),
            DisplayStatus::InPit => f.write_str("IN PIT"),
            DisplayStatus::Running => Ok(()),
            DisplayStatus::Final(status) => f.write_str(status),
        }
    }
}

/// Direction of a recent position change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PositionChange {
    Gained,
    Lost,
}

impl PositionChange {
    pub fn symbol(self) -> &'static str {
        match self {
            PositionChange::Gained => "▲",
            PositionChange::Lost => "▼",
        }
    }
}

/// A position change marker that stops showing at `expires_at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OvertakeMarker {
    pub change: PositionChange,
    pub expires_at: Timestamp,
}

/// Fastest sector times seen so far in the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SessionBests {
    pub s1: Option<Timestamp>,
    pub s2: Option<Timestamp>,
    pub s3: Option<Timestamp>,
}

impl SessionBests {
    /// Fold the sector time carried by `event` in. Returns true on a new best.
    pub fn observe(&mut self, event: &RaceEvent) -> bool {
        let slot = match event.event_type {
            EventKind::Sector1 => &mut self.s1,
            EventKind::Sector2 => &mut self.s2,
            EventKind::Lap => &mut self.s3,
            EventKind::PitIn | EventKind::PitOut => return false,
        };
        match (event.sector_time(), *slot) {
            (Some(time), Some(best)) if time >= best => false,
            (Some(time), _) => {
                *slot = Some(time);
                true
            }
            (None, _) => false,
        }
    }

    pub fn as_array(&self) -> [Option<Timestamp>; 3] {
        [self.s1, self.s2, self.s3]
    }
}

/// Everything the leaderboard knows about one driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverState {
    pub driver: String,
    pub position: u32,
    pub previous_position: u32,
    pub lap_number: u32,
    pub compound: Option<String>,
    pub tyre_life: Option<u32>,
    pub pit_stops: u32,
    pub status: DriverStatus,
    pub display_status: DisplayStatus,
    /// Current-lap sector times, cleared when a new lap begins.
    pub s1: Option<Timestamp>,
    pub s2: Option<Timestamp>,
    pub s3: Option<Timestamp>,
    /// Sector 2 and 3 of the lap just completed.
    pub prev_s2: Option<Timestamp>,
    pub prev_s3: Option<Timestamp>,
    pub previous_lap_time: Option<Timestamp>,
    pub gap_to_leader: Option<Timestamp>,
    pub interval: Option<Timestamp>,
    pub last_event_type: Option<EventKind>,
    pub last_event_lap: u32,
    /// Race time of the last applied event.
    pub last_update_time: Option<Timestamp>,
    pub personal_best: [bool; 3],
    pub overtake: Option<OvertakeMarker>,
    /// Classification carried on the driver's own events, if any.
    pub reported_status: Option<String>,
}

impl DriverState {
    /// State of a car sitting on the grid before the start.
    pub fn on_grid(driver: impl Into<String>, grid_position: u32, compound: Option<String>) -> Self {
        Self {
            driver: driver.into(),
            position: grid_position,
            previous_position: grid_position,
            lap_number: 0,
            compound,
            tyre_life: Some(1),
            pit_stops: 0,
            status: DriverStatus::OnTrack,
            display_status: DisplayStatus::Grid,
            s1: None,
            s2: None,
            s3: None,
            prev_s2: None,
            prev_s3: None,
            previous_lap_time: None,
            gap_to_leader: None,
            interval: None,
            last_event_type: None,
            last_event_lap: 0,
            last_update_time: None,
            personal_best: [false; 3],
            overtake: None,
            reported_status: None,
        }
    }

    /// Apply one event, returning the updated state.
    pub fn apply(mut self, event: &RaceEvent, overtake_window: Timestamp) -> Self {
        self.apply_in_place(event, overtake_window);
        self
    }

    /// In-place form of [`DriverState::apply`].
    pub fn apply_in_place(&mut self, event: &RaceEvent, overtake_window: Timestamp) {
        // No markers while the field is still forming up on lap 1.
        if event.position != self.previous_position && self.last_event_lap > 1 {
            let change = if event.position < self.previous_position {
                PositionChange::Gained
            } else {
                PositionChange::Lost
            };
            self.overtake = Some(OvertakeMarker {
                change,
                expires_at: event.time.saturating_add(overtake_window),
            });
        }
        self.previous_position = event.position;

        match event.event_type {
            EventKind::PitIn => self.display_status = DisplayStatus::InPit,
            EventKind::PitOut => {
                self.display_status = DisplayStatus::Out;
                self.pit_stops += 1;
            }
            EventKind::Sector1
                if matches!(self.display_status, DisplayStatus::Out | DisplayStatus::Grid) =>
            {
                self.display_status = DisplayStatus::Running;
            }
            _ => {}
        }

        if event.lap_number > self.last_event_lap {
            self.prev_s2 = self.s2.take();
            self.prev_s3 = self.s3.take();
            self.s1 = None;
        }

        self.position = event.position;
        self.lap_number = event.lap_number;
        self.compound = event.compound.clone();
        self.tyre_life = event.tyre_life;
        self.gap_to_leader = event.gap_to_leader;
        self.interval = event.interval;
        self.last_event_type = Some(event.event_type);
        self.last_event_lap = event.lap_number;
        self.last_update_time = Some(event.time);
        if let Some(status) = &event.final_status {
            self.reported_status = Some(status.clone());
        }
        self.personal_best = [
            event.is_personal_best_s1,
            event.is_personal_best_s2,
            event.is_personal_best_s3,
        ];

        match event.event_type {
            EventKind::Sector1 => self.s1 = event.sector1_time,
            EventKind::Sector2 => self.s2 = event.sector2_time,
            EventKind::Lap => {
                self.s3 = event.sector3_time;
                self.previous_lap_time = event.lap_time;
            }
            EventKind::PitIn | EventKind::PitOut => {}
        }
    }

    /// Overtake marker still showing at `now`.
    pub fn position_change_at(&self, now: Timestamp) -> Option<PositionChange> {
        self.overtake
            .filter(|marker| now < marker.expires_at)
            .map(|marker| marker.change)
    }

    /// Move an on-track driver to a final status when the stream says so, or
    /// when nothing has been heard from them for longer than `threshold`.
    ///
    /// A finisher takes `final_status`, then the status reported on their
    /// events, then "Finished".
    ///
    /// Returns true if the status changed.
    pub fn settle(
        &mut self,
        now: Timestamp,
        total_laps: u32,
        final_status: Option<&str>,
        threshold: Timestamp,
    ) -> bool {
        if !self.status.is_on_track() {
            return false;
        }
        if self.last_event_lap >= total_laps && self.last_event_type == Some(EventKind::Lap) {
            let status = final_status
                .or(self.reported_status.as_deref())
                .unwrap_or("Finished")
                .to_string();
            self.display_status = DisplayStatus::Final(status.clone());
            self.status = DriverStatus::Classified(status);
            return true;
        }
        let silent_for = now.saturating_sub(self.last_update_time.unwrap_or_default());
        if silent_for > threshold {
            self.status = DriverStatus::Classified("DNF".to_string());
            self.display_status = DisplayStatus::Final("DNF".to_string());
            return true;
        }
        false
    }
}
