//! Timeline events produced by the event-stream builder.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a timeline event marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Sector 1 completed.
    Sector1,
    /// Sector 2 completed.
    Sector2,
    /// Sector 3 completed, which is also the lap line.
    Lap,
    /// Car entered the pit lane.
    PitIn,
    /// Car left the pit lane.
    PitOut,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Sector1 => "Sector1",
            EventKind::Sector2 => "Sector2",
            EventKind::Lap => "Lap",
            EventKind::PitIn => "PitIn",
            EventKind::PitOut => "PitOut",
        };
        f.write_str(name)
    }
}

/// One sector crossing or pit transition for one driver.
///
/// Gap, interval and personal-best flags are computed upstream; the engine
/// only carries them into driver state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceEvent {
    pub time: Timestamp,
    pub driver: String,
    pub lap_number: u32,
    /// Running classification when the event happened.
    pub position: u32,
    pub event_type: EventKind,
    #[serde(default)]
    pub sector1_time: Option<Timestamp>,
    #[serde(default)]
    pub sector2_time: Option<Timestamp>,
    #[serde(default)]
    pub sector3_time: Option<Timestamp>,
    #[serde(default)]
    pub lap_time: Option<Timestamp>,
    #[serde(default)]
    pub compound: Option<String>,
    #[serde(default)]
    pub tyre_life: Option<u32>,
    #[serde(default)]
    pub final_status: Option<String>,
    #[serde(default)]
    pub is_personal_best_s1: bool,
    #[serde(default)]
    pub is_personal_best_s2: bool,
    #[serde(default)]
    pub is_personal_best_s3: bool,
    #[serde(default)]
    pub gap_to_leader: Option<Timestamp>,
    #[serde(default)]
    pub interval: Option<Timestamp>,
}

impl RaceEvent {
    /// Create an event with no timing payload.
    pub fn new(
        time: Timestamp,
        driver: impl Into<String>,
        lap_number: u32,
        position: u32,
        event_type: EventKind,
    ) -> Self {
        Self {
            time,
            driver: driver.into(),
            lap_number,
            position,
            event_type,
            sector1_time: None,
            sector2_time: None,
            sector3_time: None,
            lap_time: None,
            compound: None,
            tyre_life: None,
            final_status: None,
            is_personal_best_s1: false,
            is_personal_best_s2: false,
            is_personal_best_s3: false,
            gap_to_leader: None,
            interval: None,
        }
    }

    /// Attach the sector time matching this event's kind.
    ///
    /// For `Lap` events this is the sector 3 time; pit events carry none.
    pub fn with_sector_time(mut self, time: Timestamp) -> Self {
        match self.event_type {
            EventKind::Sector1 => self.sector1_time = Some(time),
            EventKind::Sector2 => self.sector2_time = Some(time),
            EventKind::Lap => self.sector3_time = Some(time),
            EventKind::PitIn | EventKind::PitOut => {}
        }
        self
    }

    pub fn with_lap_time(mut self, time: Timestamp) -> Self {
        self.lap_time = Some(time);
        self
    }

    pub fn with_tyre(mut self, compound: impl Into<String>, life: u32) -> Self {
        self.compound = Some(compound.into());
        self.tyre_life = Some(life);
        self
    }

    pub fn with_gaps(mut self, gap_to_leader: Timestamp, interval: Timestamp) -> Self {
        self.gap_to_leader = Some(gap_to_leader);
        self.interval = Some(interval);
        self
    }

    pub fn with_personal_bests(mut self, s1: bool, s2: bool, s3: bool) -> Self {
        self.is_personal_best_s1 = s1;
        self.is_personal_best_s2 = s2;
        self.is_personal_best_s3 = s3;
        self
    }

    /// The sector time this event reports, if any.
    pub fn sector_time(&self) -> Option<Timestamp> {
        match self.event_type {
            EventKind::Sector1 => self.sector1_time,
            EventKind::Sector2 => self.sector2_time,
            EventKind::Lap => self.sector3_time,
            EventKind::PitIn | EventKind::PitOut => None,
        }
    }
}
