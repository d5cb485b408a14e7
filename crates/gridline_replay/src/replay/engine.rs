//! Replay engine: owns the clock and dispatcher and assembles one
//! [`Frame`] per tick.

use super::clock::{PlaybackClock, Skip};
use super::dispatcher::{DispatchRules, EventDispatcher};
use super::driver::DriverState;
use super::frame::{DriverView, Frame, PlaybackStatus};
use crate::config::ReplayConfig;
use crate::error::{LoadResult, Result};
use crate::session::ReplaySession;
use crate::time::Timestamp;
use std::ops::ControlFlow;
use std::time::Duration;

/// Discrete playback controls, independent of any input device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlAction {
    TogglePause,
    SpeedUp,
    SpeedDown,
    SpeedReset,
    SkipForward,
    SkipBackward,
    /// Jump to the next time the leader starts a lap.
    NextLap,
    Quit,
}

/// Plays a [`ReplaySession`] back as a sequence of frames.
pub struct ReplayEngine {
    session: ReplaySession,
    dispatcher: EventDispatcher,
    clock: PlaybackClock,
    config: ReplayConfig,
    frames: u64,
}

impl ReplayEngine {
    /// Create an engine positioned at the first event, running.
    pub fn new(session: ReplaySession, config: ReplayConfig) -> LoadResult<Self> {
        config.validate()?;
        let rules = DispatchRules::new(
            session.total_laps(),
            config.overtake_window(),
            config.retirement_threshold(),
        )
        .with_final_status(session.final_statuses());
        let dispatcher = EventDispatcher::new(session.shared_events(), session.starting_grid(), rules);
        let clock = PlaybackClock::new(Timestamp::zero(), config.initial_speed, config.skip_offset())
            .with_speed_limits(config.min_speed, config.max_speed);

        Ok(Self {
            session,
            dispatcher,
            clock,
            config,
            frames: 0,
        })
    }

    pub fn session(&self) -> &ReplaySession {
        &self.session
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn race_time(&self) -> Timestamp {
        self.clock.position()
    }

    pub fn driver(&self, driver: &str) -> Option<&DriverState> {
        self.dispatcher.driver(driver)
    }

    /// Every event has been applied.
    pub fn is_finished(&self) -> bool {
        self.dispatcher.is_drained()
    }

    /// Apply a control action. `Break` means playback should stop.
    pub fn control(&mut self, action: ControlAction) -> Result<ControlFlow<()>> {
        tracing::debug!(?action, race_time = %self.clock.position(), "control");
        match action {
            ControlAction::TogglePause => self.clock.toggle_pause(),
            ControlAction::SpeedUp => self.clock.speed_up(),
            ControlAction::SpeedDown => self.clock.speed_down(),
            ControlAction::SpeedReset => self.clock.reset_speed(),
            ControlAction::SkipForward => {
                self.clock.skip_forward();
            }
            ControlAction::SkipBackward => {
                if self.clock.skip_backward() == Skip::Backward {
                    self.dispatcher.seek(self.clock.position())?;
                }
            }
            ControlAction::NextLap => {
                if let Some(start) = self.session.next_lap_start(self.clock.position()) {
                    self.clock.seek(start);
                }
            }
            ControlAction::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Advance the clock by the wall time since the last frame and assemble.
    pub fn frame(&mut self) -> Result<Frame> {
        self.clock.update();
        self.assemble()
    }

    /// Advance the clock by an explicit wall-time step and assemble.
    pub fn frame_after(&mut self, elapsed: Duration) -> Result<Frame> {
        self.clock.advance(elapsed);
        self.assemble()
    }

    /// The starting grid, before any event is applied.
    pub fn preview(&self) -> Frame {
        self.snapshot(false)
    }

    fn assemble(&mut self) -> Result<Frame> {
        self.dispatcher.advance(self.clock.position())?;
        self.frames += 1;
        Ok(self.snapshot(true))
    }

    /// Drivers ordered on-track first by live position, then the rest by
    /// last known position. Ties keep grid order.
    fn ranked(&self) -> Vec<&DriverState> {
        let mut ranked: Vec<&DriverState> = self.dispatcher.drivers().values().collect();
        ranked.sort_by_key(|state| (!state.status.is_on_track(), state.position));
        ranked
    }

    fn snapshot(&self, started: bool) -> Frame {
        let race_time = self.clock.position();
        let conditions = self.session.conditions().sample(race_time);
        let bests = self.dispatcher.session_bests();
        let ranked = self.ranked();

        let (lap, progress) = match ranked.first() {
            Some(leader) if !leader.status.is_on_track() => (leader.lap_number, 1.0),
            Some(leader) => {
                let completed = leader.lap_number.saturating_sub(1);
                let total = self.session.total_laps();
                (leader.lap_number, completed as f32 / total as f32)
            }
            None => (0, 0.0),
        };

        let ranking = ranked
            .into_iter()
            .map(|state| {
                let team = self.session.team(&state.driver).unwrap_or("Unknown");
                DriverView::new(
                    team.to_string(),
                    state.clone(),
                    race_time,
                    &bests,
                    conditions.drs_enabled,
                )
            })
            .collect();

        Frame {
            race_time,
            started,
            lap,
            total_laps: self.session.total_laps(),
            progress,
            ranking,
            conditions,
            session_bests: bests,
            playback: PlaybackStatus {
                paused: self.clock.is_paused(),
                speed: self.clock.speed(),
            },
            finished: self.dispatcher.is_drained(),
            frame_number: self.frames,
        }
    }
}
