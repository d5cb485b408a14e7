//! Per-tick snapshot handed to the renderer.

use super::driver::{DriverState, PositionChange, SessionBests};
use crate::conditions::ConditionsSample;
use crate::time::Timestamp;

/// How a sector time compares with the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectorMark {
    /// Fastest in the session so far.
    SessionBest,
    /// The driver's own fastest so far.
    PersonalBest,
    Normal,
}

impl SectorMark {
    fn classify(time: Option<Timestamp>, best: Option<Timestamp>, personal_best: bool) -> Self {
        match (time, best) {
            (Some(time), Some(best)) if time == best => SectorMark::SessionBest,
            _ if personal_best => SectorMark::PersonalBest,
            _ => SectorMark::Normal,
        }
    }
}

/// Clock state at the time of the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackStatus {
    pub paused: bool,
    pub speed: f64,
}

/// One ranked row.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverView {
    pub team: String,
    pub state: DriverState,
    /// Overtake marker, if still showing.
    pub position_change: Option<PositionChange>,
    pub sector_marks: [SectorMark; 3],
    /// DRS enabled and within a second of the car ahead.
    pub drs_eligible: bool,
}

impl DriverView {
    pub(crate) fn new(
        team: String,
        state: DriverState,
        race_time: Timestamp,
        bests: &SessionBests,
        drs_enabled: bool,
    ) -> Self {
        let times = [state.s1, state.s2, state.s3];
        let best = bests.as_array();
        let sector_marks =
            std::array::from_fn(|i| SectorMark::classify(times[i], best[i], state.personal_best[i]));
        let drs_eligible = drs_enabled
            && state
                .interval
                .is_some_and(|interval| interval < Timestamp::from_secs(1));
        Self {
            team,
            position_change: state.position_change_at(race_time),
            sector_marks,
            drs_eligible,
            state,
        }
    }

    pub fn driver(&self) -> &str {
        &self.state.driver
    }
}

/// Immutable snapshot of the race at one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Race time since the first event.
    pub race_time: Timestamp,
    /// False for the pre-start grid preview.
    pub started: bool,
    /// Leader's lap.
    pub lap: u32,
    pub total_laps: u32,
    /// Completed share of the race, 0.0 to 1.0.
    pub progress: f32,
    /// Drivers in leaderboard order.
    pub ranking: Vec<DriverView>,
    pub conditions: ConditionsSample,
    pub session_bests: SessionBests,
    pub playback: PlaybackStatus,
    /// Every event has been applied.
    pub finished: bool,
    /// Frames produced so far, this one included.
    pub frame_number: u64,
}

impl Frame {
    /// Driver ids in leaderboard order.
    pub fn order(&self) -> Vec<&str> {
        self.ranking.iter().map(DriverView::driver).collect()
    }

    pub fn leader(&self) -> Option<&DriverView> {
        self.ranking.first()
    }

    pub fn view(&self, driver: &str) -> Option<&DriverView> {
        self.ranking.iter().find(|view| view.driver() == driver)
    }
}
