//! Replay tunables.

use crate::error::{LoadError, LoadResult};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_FRAME_RATE: u64 = 20;

/// Configuration for the replay engine.
///
/// Durations are in (simulated or wall) seconds so the struct reads
/// naturally from a `[replay]` TOML table.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Target frames per second of the playback loop.
    pub frame_rate: f64,
    /// Playback speed at startup (1.0 = real time).
    pub initial_speed: f64,
    /// Lower speed clamp. Must be positive.
    pub min_speed: f64,
    /// Upper speed clamp.
    pub max_speed: f64,
    /// Race seconds moved by one skip forward/backward.
    pub skip_seconds: f64,
    /// Race seconds an overtake marker stays visible.
    pub overtake_window_secs: f64,
    /// Race seconds without an event before an on-track car is taken as retired.
    pub retirement_threshold_secs: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE as f64,
            initial_speed: 1.0,
            min_speed: 0.25,
            max_speed: 64.0,
            skip_seconds: 10.0,
            overtake_window_secs: 4.0,
            retirement_threshold_secs: 120.0,
        }
    }
}

impl ReplayConfig {
    /// Set the initial playback speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.initial_speed = speed;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_retirement_threshold(mut self, secs: f64) -> Self {
        self.retirement_threshold_secs = secs;
        self
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> LoadResult<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(LoadError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )))
            }
        };
        positive("frame_rate", self.frame_rate)?;
        positive("initial_speed", self.initial_speed)?;
        positive("min_speed", self.min_speed)?;
        positive("max_speed", self.max_speed)?;
        positive("skip_seconds", self.skip_seconds)?;
        positive("overtake_window_secs", self.overtake_window_secs)?;
        positive("retirement_threshold_secs", self.retirement_threshold_secs)?;

        if Duration::try_from_secs_f64(1.0 / self.frame_rate).is_err() {
            return Err(LoadError::InvalidConfig(format!(
                "frame_rate {} gives a frame duration out of range",
                self.frame_rate
            )));
        }
        // Race-time values are held as whole microseconds in a u64.
        let race_seconds = |name: &str, value: f64| {
            if value * 1_000_000.0 < u64::MAX as f64 {
                Ok(())
            } else {
                Err(LoadError::InvalidConfig(format!(
                    "{name} of {value}s is out of range"
                )))
            }
        };
        race_seconds("skip_seconds", self.skip_seconds)?;
        race_seconds("overtake_window_secs", self.overtake_window_secs)?;
        race_seconds("retirement_threshold_secs", self.retirement_threshold_secs)?;

        if self.min_speed > self.max_speed {
            return Err(LoadError::InvalidConfig(format!(
                "min_speed {} exceeds max_speed {}",
                self.min_speed, self.max_speed
            )));
        }
        Ok(())
    }

    /// Wall-clock budget of one frame.
    ///
    /// Falls back to the default rate for a value [`ReplayConfig::validate`]
    /// would reject.
    pub fn frame_duration(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.frame_rate)
            .unwrap_or(Duration::from_millis(1_000 / DEFAULT_FRAME_RATE))
    }

    pub fn skip_offset(&self) -> Timestamp {
        Timestamp::from_secs_f64(self.skip_seconds)
    }

    pub fn overtake_window(&self) -> Timestamp {
        Timestamp::from_secs_f64(self.overtake_window_secs)
    }

    pub fn retirement_threshold(&self) -> Timestamp {
        Timestamp::from_secs_f64(self.retirement_threshold_secs)
    }
}
