//! Session time values.
//!
//! Everything the engine measures (race time, sector times, gaps) is a
//! [`Timestamp`]: a non-negative number of microseconds. On the wire it is
//! written as floating-point seconds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// A point in, or span of, session time with microsecond resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000)
    }

    /// Convert from fractional seconds. Negative and non-finite input clamps to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::zero();
        }
        Self((secs * 1_000_000.0).round() as u64)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub const fn saturating_add(self, other: Timestamp) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub const fn saturating_sub(self, other: Timestamp) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub const fn checked_sub(self, other: Timestamp) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(micros) => Some(Self(micros)),
            None => None,
        }
    }

    /// Scale a wall-clock duration by a playback multiplier.
    pub fn scaled(elapsed: Duration, factor: f64) -> Self {
        Self::from_secs_f64(elapsed.as_secs_f64() * factor)
    }
}

impl From<Duration> for Timestamp {
    fn from(duration: Duration) -> Self {
        Self(duration.as_micros().min(u64::MAX as u128) as u64)
    }
}

impl From<Timestamp> for Duration {
    fn from(ts: Timestamp) -> Self {
        Duration::from_micros(ts.0)
    }
}

/// `m:ss.mmm` above one minute, `s.mmm` below.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0 / 1_000;
        let minutes = millis / 60_000;
        let seconds = (millis / 1_000) % 60;
        let frac = millis % 1_000;
        if minutes > 0 {
            write!(f, "{minutes}:{seconds:02}.{frac:03}")
        } else {
            write!(f, "{seconds}.{frac:03}")
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_secs_f64())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if secs.is_nan() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "session time must be a non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Self::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Timestamp::from_secs(2).as_micros(), 2_000_000);
        assert_eq!(Timestamp::from_millis(1_500).as_micros(), 1_500_000);
        assert_eq!(Timestamp::from_secs_f64(0.25).as_micros(), 250_000);
        assert_eq!(Timestamp::from_secs_f64(-3.0), Timestamp::zero());
        assert_eq!(Timestamp::from_secs_f64(f64::NAN), Timestamp::zero());
    }

    #[test]
    fn test_saturating_arithmetic() {
        let a = Timestamp::from_secs(5);
        let b = Timestamp::from_secs(8);
        assert_eq!(a.saturating_sub(b), Timestamp::zero());
        assert_eq!(b.saturating_sub(a), Timestamp::from_secs(3));
        assert_eq!(a.checked_sub(b), None);
        assert_eq!(a.saturating_add(b), Timestamp::from_secs(13));
    }

    #[test]
    fn test_scaled() {
        let ts = Timestamp::scaled(Duration::from_millis(50), 4.0);
        assert_eq!(ts, Timestamp::from_millis(200));
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::from_millis(83_456).to_string(), "1:23.456");
        assert_eq!(Timestamp::from_millis(9_050).to_string(), "9.050");
    }

    #[test]
    fn test_serde_seconds() {
        let ts: Timestamp = serde_json::from_str("12.5").unwrap();
        assert_eq!(ts, Timestamp::from_millis(12_500));
        assert_eq!(serde_json::to_string(&ts).unwrap(), "12.5");
        assert!(serde_json::from_str::<Timestamp>("-1.0").is_err());
    }
}
