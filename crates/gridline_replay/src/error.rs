//! Replay error types

use crate::time::Timestamp;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems with the replay inputs, reported before playback starts.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A required input file does not exist
    #[error("required input missing: {}", .0.display())]
    MissingInput(PathBuf),

    /// An input file exists but could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file could not be decoded
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Nothing to replay
    #[error("event stream contains no events")]
    EmptyTimeline,

    /// No entrants to seed the starting grid
    #[error("race has no entrants")]
    NoEntrants,

    /// The same driver appears twice in the entrant list
    #[error("duplicate entrant: {0}")]
    DuplicateEntrant(String),

    /// No event carries a lap number above zero
    #[error("cannot determine total lap count from the event stream")]
    UnknownLapCount,

    /// Events must be in non-decreasing time order
    #[error("event {index} at {time} precedes the event before it at {previous}")]
    Unsorted {
        index: usize,
        time: Timestamp,
        previous: Timestamp,
    },

    /// An event references a driver that is not on the grid
    #[error("event {index} references unknown driver {driver}")]
    UnknownDriver { index: usize, driver: String },

    /// A replay setting is out of range
    #[error("invalid replay config: {0}")]
    InvalidConfig(String),
}

/// Faults raised while the replay loop is running.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Event application reached a driver that has no state record
    #[error("no state for driver {driver} at race time {race_time} (next event {next_index})")]
    MissingDriverState {
        driver: String,
        race_time: Timestamp,
        next_index: usize,
    },
}

/// Result type for loading replay inputs
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Result type for replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;
