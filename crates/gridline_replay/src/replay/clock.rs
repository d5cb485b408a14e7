//! Playback clock for race replay.
//!
//! Turns elapsed wall time into race time under a speed multiplier,
//! and handles pause and skips.

use crate::time::Timestamp;
use std::time::{Duration, Instant};

/// What a skip did to the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Skip {
    /// Time moved forward; applied state stays valid.
    Forward,
    /// Time moved backward; applied state must be rebuilt.
    Backward,
    /// Nothing changed.
    None,
}

/// The single source of truth for current race time.
///
/// The clock can be:
/// - Paused/resumed
/// - Skipped forward or back by a fixed offset
/// - Played at different speeds (doubling/halving within clamps)
#[derive(Debug)]
pub struct PlaybackClock {
    /// Current race time.
    position: Timestamp,
    /// Earliest time the clock may be moved back to.
    origin: Timestamp,
    paused: bool,
    /// Playback speed multiplier (1.0 = real time).
    speed: f64,
    default_speed: f64,
    min_speed: f64,
    max_speed: f64,
    skip_offset: Timestamp,
    /// Wall-clock instant of the last update.
    last_update: Option<Instant>,
}

impl PlaybackClock {
    /// Create a running clock positioned at `origin`.
    pub fn new(origin: Timestamp, speed: f64, skip_offset: Timestamp) -> Self {
        Self {
            position: origin,
            origin,
            paused: false,
            speed,
            default_speed: 1.0,
            min_speed: 0.25,
            max_speed: 64.0,
            skip_offset,
            last_update: None,
        }
        .with_speed_limits(0.25, 64.0)
    }

    /// Set the speed clamps; the current speed is clamped into them.
    pub fn with_speed_limits(mut self, min: f64, max: f64) -> Self {
        self.min_speed = min;
        self.max_speed = max;
        self.speed = self.speed.clamp(min, max);
        self
    }

    /// Get the current race time.
    pub fn position(&self) -> Timestamp {
        self.position
    }

    pub fn origin(&self) -> Timestamp {
        self.origin
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Get the current playback speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the playback speed, clamped to the configured limits.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(self.min_speed, self.max_speed);
    }

    pub fn speed_up(&mut self) {
        self.set_speed(self.speed * 2.0);
    }

    pub fn speed_down(&mut self) {
        self.set_speed(self.speed / 2.0);
    }

    pub fn reset_speed(&mut self) {
        self.set_speed(self.default_speed);
    }

    /// Toggle pause. Race time is frozen while paused.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Advance by `elapsed` wall time at the current speed.
    ///
    /// Returns the race time added, which is zero while paused.
    pub fn advance(&mut self, elapsed: Duration) -> Timestamp {
        if self.paused {
            return Timestamp::zero();
        }
        let delta = Timestamp::scaled(elapsed, self.speed);
        self.position = self.position.saturating_add(delta);
        delta
    }

    /// Advance by the wall time since the previous update.
    ///
    /// The first call only starts measuring.
    pub fn update(&mut self) -> Timestamp {
        let now = Instant::now();
        let elapsed = self
            .last_update
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_update = Some(now);
        self.advance(elapsed)
    }

    /// Jump forward by the skip offset.
    pub fn skip_forward(&mut self) -> Skip {
        self.position = self.position.saturating_add(self.skip_offset);
        Skip::Forward
    }

    /// Jump back by the skip offset, never before the origin.
    pub fn skip_backward(&mut self) -> Skip {
        let target = self.position.saturating_sub(self.skip_offset).max(self.origin);
        self.seek(target)
    }

    /// Move to an absolute race time (not before the origin).
    pub fn seek(&mut self, position: Timestamp) -> Skip {
        let position = position.max(self.origin);
        let skip = match position.cmp(&self.position) {
            std::cmp::Ordering::Greater => Skip::Forward,
            std::cmp::Ordering::Less => Skip::Backward,
            std::cmp::Ordering::Equal => Skip::None,
        };
        self.position = position;
        skip
    }
}
