//! Track conditions over time: flag status, rainfall and DRS permission.
//!
//! Each series is a step function over session-absolute time. Sampling
//! returns the value of the last entry at or before the query time, or the
//! series default when there is none.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A step-function series of `(time, value)` entries.
#[derive(Clone, Debug, PartialEq)]
pub struct AuxTimeline<T> {
    entries: Vec<(Timestamp, T)>,
    default: T,
}

impl<T> AuxTimeline<T> {
    /// An empty series that always samples to `default`.
    pub fn new(default: T) -> Self {
        Self {
            entries: Vec::new(),
            default,
        }
    }

    /// Build a series from entries. Entries are stably ordered by time.
    pub fn from_entries(entries: impl IntoIterator<Item = (Timestamp, T)>, default: T) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by_key(|(time, _)| *time);
        Self { entries, default }
    }

    /// Value in effect at `at`.
    pub fn sample(&self, at: Timestamp) -> &T {
        let idx = self.entries.partition_point(|(time, _)| *time <= at);
        match idx {
            0 => &self.default,
            n => &self.entries[n - 1].1,
        }
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Track status as reported by race control.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrackStatus {
    #[default]
    Clear,
    Yellow,
    SafetyCar,
    Red,
    VscDeployed,
    VscEnding,
    /// A code this engine has no meaning for.
    Unknown(String),
}

impl TrackStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => TrackStatus::Clear,
            "2" => TrackStatus::Yellow,
            "4" => TrackStatus::SafetyCar,
            "5" => TrackStatus::Red,
            "6" => TrackStatus::VscDeployed,
            "7" => TrackStatus::VscEnding,
            other => TrackStatus::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TrackStatus::Clear => "TRACK CLEAR",
            TrackStatus::Yellow => "YELLOW FLAG",
            TrackStatus::SafetyCar => "SAFETY CAR",
            TrackStatus::Red => "RED FLAG",
            TrackStatus::VscDeployed => "VSC DEPLOYED",
            TrackStatus::VscEnding => "VSC ENDING",
            TrackStatus::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of `track_status.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackStatusRecord {
    pub time: Timestamp,
    pub status: String,
}

/// One row of `weather.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub time: Timestamp,
    pub rainfall: bool,
}

/// One row of `race_control.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RaceControlMessage {
    pub time: Timestamp,
    pub message: String,
}

/// Track status series from raw records.
pub fn track_status_timeline(records: &[TrackStatusRecord]) -> AuxTimeline<TrackStatus> {
    AuxTimeline::from_entries(
        records
            .iter()
            .map(|r| (r.time, TrackStatus::from_code(&r.status))),
        TrackStatus::Clear,
    )
}

/// Wet-track series from weather records.
pub fn wet_timeline(records: &[WeatherRecord]) -> AuxTimeline<bool> {
    AuxTimeline::from_entries(records.iter().map(|r| (r.time, r.rainfall)), false)
}

/// DRS permission series derived from race control messages.
///
/// Starts disabled at session time zero; every message mentioning DRS
/// switches it, enabled iff the message says so. Returns `None` when no
/// message mentions DRS.
pub fn drs_timeline(messages: &[RaceControlMessage]) -> Option<AuxTimeline<bool>> {
    let mut entries = vec![(Timestamp::zero(), false)];
    entries.extend(
        messages
            .iter()
            .filter(|m| m.message.contains("DRS"))
            .map(|m| (m.time, m.message.to_uppercase().contains("ENABLED"))),
    );
    if entries.len() == 1 {
        return None;
    }
    Some(AuxTimeline::from_entries(entries, false))
}

/// Sampled conditions at one instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionsSample {
    pub track_status: TrackStatus,
    pub wet: bool,
    pub drs_enabled: bool,
}

/// The three condition series plus the offset between replay time and
/// session-absolute time.
#[derive(Clone, Debug)]
pub struct Conditions {
    pub track_status: AuxTimeline<TrackStatus>,
    pub wet: AuxTimeline<bool>,
    pub drs: AuxTimeline<bool>,
    session_offset: Timestamp,
}

impl Conditions {
    pub fn new(
        track_status: AuxTimeline<TrackStatus>,
        wet: AuxTimeline<bool>,
        drs: AuxTimeline<bool>,
    ) -> Self {
        Self {
            track_status,
            wet,
            drs,
            session_offset: Timestamp::zero(),
        }
    }

    /// Set the session-absolute time that replay time zero corresponds to.
    pub fn with_session_offset(mut self, offset: Timestamp) -> Self {
        self.session_offset = offset;
        self
    }

    pub fn session_offset(&self) -> Timestamp {
        self.session_offset
    }

    /// Sample every series at a replay-relative race time.
    pub fn sample(&self, race_time: Timestamp) -> ConditionsSample {
        let at = race_time.saturating_add(self.session_offset);
        ConditionsSample {
            track_status: self.track_status.sample(at).clone(),
            wet: *self.wet.sample(at),
            drs_enabled: *self.drs.sample(at),
        }
    }
}

impl Default for Conditions {
    fn default() -> Self {
        Self::new(
            AuxTimeline::new(TrackStatus::Clear),
            AuxTimeline::new(false),
            AuxTimeline::new(false),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Timestamp {
        Timestamp::from_secs(s)
    }

    #[test]
    fn test_empty_series_samples_default() {
        let series: AuxTimeline<bool> = AuxTimeline::new(false);
        assert!(series.is_empty());
        assert!(!*series.sample(secs(0)));
        assert!(!*series.sample(secs(10_000)));
    }

    #[test]
    fn test_single_entry() {
        let series = AuxTimeline::from_entries([(secs(10), 7u8)], 0);
        assert_eq!(*series.sample(secs(9)), 0);
        assert_eq!(*series.sample(secs(10)), 7);
        assert_eq!(*series.sample(secs(99)), 7);
    }

    #[test]
    fn test_step_function() {
        let series = AuxTimeline::from_entries(
            [(secs(5), "a"), (secs(10), "b"), (secs(20), "c")],
            "none",
        );
        assert_eq!(*series.sample(secs(4)), "none");
        assert_eq!(*series.sample(secs(5)), "a");
        assert_eq!(*series.sample(Timestamp::from_micros(9_999_999)), "a");
        assert_eq!(*series.sample(secs(10)), "b");
        assert_eq!(*series.sample(secs(19)), "b");
        assert_eq!(*series.sample(secs(20)), "c");
        assert_eq!(*series.sample(secs(500)), "c");
    }

    #[test]
    fn test_track_status_codes() {
        assert_eq!(TrackStatus::from_code("1"), TrackStatus::Clear);
        assert_eq!(TrackStatus::from_code("4"), TrackStatus::SafetyCar);
        assert_eq!(TrackStatus::from_code(" 5 "), TrackStatus::Red);
        assert_eq!(
            TrackStatus::from_code("3"),
            TrackStatus::Unknown("3".to_string())
        );
        assert_eq!(TrackStatus::VscDeployed.to_string(), "VSC DEPLOYED");
    }

    #[test]
    fn test_drs_from_race_control() {
        let messages = vec![
            RaceControlMessage {
                time: secs(100),
                message: "GREEN LIGHT - PIT EXIT OPEN".to_string(),
            },
            RaceControlMessage {
                time: secs(400),
                message: "DRS ENABLED".to_string(),
            },
            RaceControlMessage {
                time: secs(900),
                message: "DRS DISABLED".to_string(),
            },
        ];
        let drs = drs_timeline(&messages).unwrap();
        assert_eq!(drs.len(), 3);
        assert!(!*drs.sample(secs(399)));
        assert!(*drs.sample(secs(400)));
        assert!(!*drs.sample(secs(900)));

        let none = drs_timeline(&messages[..1]);
        assert!(none.is_none());
    }

    #[test]
    fn test_conditions_apply_session_offset() {
        let conditions = Conditions::new(
            track_status_timeline(&[TrackStatusRecord {
                time: secs(3_650),
                status: "4".to_string(),
            }]),
            wet_timeline(&[WeatherRecord {
                time: secs(3_600),
                rainfall: true,
            }]),
            AuxTimeline::new(false),
        )
        .with_session_offset(secs(3_600));

        let start = conditions.sample(secs(0));
        assert_eq!(start.track_status, TrackStatus::Clear);
        assert!(start.wet);
        assert!(!start.drs_enabled);

        let later = conditions.sample(secs(50));
        assert_eq!(later.track_status, TrackStatus::SafetyCar);
    }

    #[test]
    fn test_default_conditions() {
        let sample = Conditions::default().sample(secs(1_000));
        assert_eq!(sample, ConditionsSample::default());
    }
}
