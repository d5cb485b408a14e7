//! Loading and validating a race for replay.
//!
//! A race directory holds the event-stream builder's output:
//!
//! | file                | required | contents                         |
//! |---------------------|----------|----------------------------------|
//! | `timeline.json`     | yes      | time-sorted [`RaceEvent`]s       |
//! | `race.json`         | yes      | [`RaceInfo`]: name and entrants  |
//! | `track_status.json` | no       | [`TrackStatusRecord`]s           |
//! | `weather.json`      | no       | [`WeatherRecord`]s               |
//! | `race_control.json` | no       | [`RaceControlMessage`]s (DRS)    |
//!
//! Missing optional files fall back to the series default for the whole
//! replay and are logged, never fatal.

use crate::conditions::{
    drs_timeline, track_status_timeline, wet_timeline, AuxTimeline, Conditions,
    RaceControlMessage, TrackStatus, TrackStatusRecord, WeatherRecord,
};
use crate::error::{LoadError, LoadResult};
use crate::event::{EventKind, RaceEvent};
use crate::replay::DriverState;
use crate::time::Timestamp;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const TIMELINE_FILE: &str = "timeline.json";
pub const RACE_FILE: &str = "race.json";
pub const TRACK_STATUS_FILE: &str = "track_status.json";
pub const WEATHER_FILE: &str = "weather.json";
pub const RACE_CONTROL_FILE: &str = "race_control.json";

/// One car in the race.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    pub driver: String,
    pub team: String,
    pub grid_position: u32,
    #[serde(default)]
    pub starting_compound: Option<String>,
    /// Official result, shown once the car takes the flag.
    #[serde(default)]
    pub final_status: Option<String>,
}

/// Race metadata and entrants, in results order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceInfo {
    pub name: String,
    #[serde(default)]
    pub year: Option<u16>,
    pub entrants: Vec<Entrant>,
}

/// A validated race ready to be replayed.
///
/// Event times are rebased so the first event is at race time zero.
#[derive(Clone, Debug)]
pub struct ReplaySession {
    info: RaceInfo,
    /// Shared with the engine's dispatcher rather than copied.
    events: Arc<[RaceEvent]>,
    conditions: Conditions,
    total_laps: u32,
    session_offset: Timestamp,
    lap_starts: BTreeMap<u32, Timestamp>,
    teams: FxHashMap<String, String>,
}

impl ReplaySession {
    /// Validate inputs and build a session.
    pub fn new(info: RaceInfo, mut events: Vec<RaceEvent>, conditions: Conditions) -> LoadResult<Self> {
        if info.entrants.is_empty() {
            return Err(LoadError::NoEntrants);
        }
        let mut known = FxHashSet::default();
        for entrant in &info.entrants {
            if !known.insert(entrant.driver.as_str()) {
                return Err(LoadError::DuplicateEntrant(entrant.driver.clone()));
            }
        }

        let first_time = events.first().ok_or(LoadError::EmptyTimeline)?.time;
        for (index, pair) in events.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(LoadError::Unsorted {
                    index: index + 1,
                    time: pair[1].time,
                    previous: pair[0].time,
                });
            }
        }
        if let Some((index, event)) = events
            .iter()
            .enumerate()
            .find(|(_, e)| !known.contains(e.driver.as_str()))
        {
            return Err(LoadError::UnknownDriver {
                index,
                driver: event.driver.clone(),
            });
        }

        let total_laps = events
            .iter()
            .map(|e| e.lap_number)
            .max()
            .filter(|&laps| laps > 0)
            .ok_or(LoadError::UnknownLapCount)?;

        for event in &mut events {
            event.time = event.time.saturating_sub(first_time);
        }

        let mut lap_starts = BTreeMap::from([(1, Timestamp::zero())]);
        for event in events.iter().filter(|e| e.event_type == EventKind::Lap) {
            lap_starts.entry(event.lap_number + 1).or_insert(event.time);
        }

        let teams = info
            .entrants
            .iter()
            .map(|e| (e.driver.clone(), e.team.clone()))
            .collect();

        tracing::info!(
            race = %info.name,
            entrants = info.entrants.len(),
            events = events.len(),
            total_laps,
            "race loaded"
        );

        Ok(Self {
            info,
            events: events.into(),
            conditions: conditions.with_session_offset(first_time),
            total_laps,
            session_offset: first_time,
            lap_starts,
            teams,
        })
    }

    /// Load a race directory.
    pub fn load(dir: &Path) -> LoadResult<Self> {
        let info: RaceInfo = read_required(dir, RACE_FILE)?;
        let events: Vec<RaceEvent> = read_required(dir, TIMELINE_FILE)?;

        let track_status = match read_optional::<Vec<TrackStatusRecord>>(dir, TRACK_STATUS_FILE)? {
            Some(records) => track_status_timeline(&records),
            None => AuxTimeline::new(TrackStatus::Clear),
        };
        let wet = match read_optional::<Vec<WeatherRecord>>(dir, WEATHER_FILE)? {
            Some(records) => wet_timeline(&records),
            None => AuxTimeline::new(false),
        };
        let drs = match read_optional::<Vec<RaceControlMessage>>(dir, RACE_CONTROL_FILE)? {
            Some(messages) => drs_timeline(&messages).unwrap_or_else(|| {
                tracing::warn!("no DRS messages in race control; DRS shown as disabled");
                AuxTimeline::new(false)
            }),
            None => AuxTimeline::new(false),
        };

        Self::new(info, events, Conditions::new(track_status, wet, drs))
    }

    pub fn info(&self) -> &RaceInfo {
        &self.info
    }

    pub fn events(&self) -> &[RaceEvent] {
        &self.events
    }

    /// Handle on the event stream that shares the same allocation.
    pub fn shared_events(&self) -> Arc<[RaceEvent]> {
        Arc::clone(&self.events)
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn total_laps(&self) -> u32 {
        self.total_laps
    }

    /// Session-absolute time of the first event.
    pub fn session_offset(&self) -> Timestamp {
        self.session_offset
    }

    /// Race time at which `lap` starts, if the stream reaches it.
    pub fn lap_start(&self, lap: u32) -> Option<Timestamp> {
        self.lap_starts.get(&lap).copied()
    }

    /// First lap start strictly after `after`.
    pub fn next_lap_start(&self, after: Timestamp) -> Option<Timestamp> {
        self.lap_starts.values().copied().filter(|&t| t > after).min()
    }

    pub fn team(&self, driver: &str) -> Option<&str> {
        self.teams.get(driver).map(String::as_str)
    }

    pub fn final_status(&self, driver: &str) -> Option<&str> {
        self.info
            .entrants
            .iter()
            .find(|e| e.driver == driver)
            .and_then(|e| e.final_status.as_deref())
    }

    /// Official classification of every entrant that has one.
    pub fn final_statuses(&self) -> FxHashMap<String, String> {
        self.info
            .entrants
            .iter()
            .filter_map(|e| Some((e.driver.clone(), e.final_status.clone()?)))
            .collect()
    }

    /// Initial driver states, ordered by grid position.
    ///
    /// A missing starting compound is taken from the driver's first event.
    pub fn starting_grid(&self) -> IndexMap<String, DriverState> {
        let mut entrants: Vec<&Entrant> = self.info.entrants.iter().collect();
        entrants.sort_by_key(|e| e.grid_position);
        entrants
            .into_iter()
            .map(|entrant| {
                let compound = entrant.starting_compound.clone().or_else(|| {
                    self.events
                        .iter()
                        .find(|e| e.driver == entrant.driver)
                        .and_then(|e| e.compound.clone())
                });
                (
                    entrant.driver.clone(),
                    DriverState::on_grid(&entrant.driver, entrant.grid_position, compound),
                )
            })
            .collect()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> LoadResult<T> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_required<T: DeserializeOwned>(dir: &Path, name: &str) -> LoadResult<T> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(LoadError::MissingInput(path));
    }
    read_json(&path)
}

fn read_optional<T: DeserializeOwned>(dir: &Path, name: &str) -> LoadResult<Option<T>> {
    let path = dir.join(name);
    if !path.exists() {
        tracing::warn!(file = %path.display(), "optional series missing; using defaults");
        return Ok(None);
    }
    read_json(&path).map(Some)
}
