//! # Time Source
//!
//! Wall-clock access for all subsystems. Round timeouts and id derivation
//! read the clock through [`TimeSource`] so tests can pin it.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;

/// Source of the current UTC time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Default time source using system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Clock pinned at 2024-01-01T00:00:00Z.
    pub fn at_epoch_start() -> Self {
        Self::new(DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default())
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.write() = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// ISO-8601 UTC with microsecond precision and a literal trailing `Z`.
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso8601_has_trailing_z() {
        let clock = ManualClock::at_epoch_start();
        assert_eq!(iso8601(clock.now()), "2024-01-01T00:00:00.000000Z");
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at_epoch_start();
        let start = clock.now();
        clock.advance(chrono::Duration::seconds(31));
        assert_eq!((clock.now() - start).num_seconds(), 31);
    }
}
