//! Replay engine for recorded races.
//!
//! This module provides:
//! - `PlaybackClock` - race time under pause, speed and skip control
//! - `EventDispatcher` - applies due events to per-driver state
//! - `DriverState` - the per-driver record and its event transition
//! - `ReplayEngine` - assembles a `Frame` snapshot every tick
//!
//! # Example
//!
//! ```ignore
//! use gridline_replay::{ReplayConfig, ReplayEngine, ReplaySession};
//!
//! let session = ReplaySession::load(Path::new("races/2025_Dutch_Grand_Prix"))?;
//! let mut engine = ReplayEngine::new(session, ReplayConfig::default().with_speed(4.0))?;
//!
//! while !engine.is_finished() {
//!     let frame = engine.frame()?;
//!     draw(&frame);
//! }
//! ```

mod clock;
mod dispatcher;
mod driver;
mod engine;
mod frame;

pub use clock::{PlaybackClock, Skip};
pub use dispatcher::{DispatchRules, EventDispatcher};
pub use driver::{
    DisplayStatus, DriverState, DriverStatus, OvertakeMarker, PositionChange, SessionBests,
};
pub use engine::{ControlAction, ReplayEngine};
pub use frame::{DriverView, Frame, PlaybackStatus, SectorMark};
