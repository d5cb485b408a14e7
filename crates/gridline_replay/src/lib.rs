//! Gridline replay engine
//!
//! Reconstructs a race's running order, sector times, pit activity and track
//! conditions from a precomputed event stream and plays it back under
//! interactive control: pause, variable speed, skip forward and back.
//!
//! The engine is single-threaded. A caller drives it once per tick with
//! [`ReplayEngine::frame`] and receives an immutable [`Frame`] to render.

pub mod conditions;
pub mod config;
pub mod error;
pub mod event;
pub mod replay;
pub mod session;
pub mod time;

pub use conditions::{AuxTimeline, Conditions, ConditionsSample, TrackStatus};
pub use config::ReplayConfig;
pub use error::{LoadError, LoadResult, ReplayError, Result};
pub use event::{EventKind, RaceEvent};
pub use replay::{
    ControlAction, DisplayStatus, DriverState, DriverStatus, DriverView, Frame, PositionChange,
    ReplayEngine, SectorMark, SessionBests,
};
pub use session::{Entrant, RaceInfo, ReplaySession};
pub use time::Timestamp;
