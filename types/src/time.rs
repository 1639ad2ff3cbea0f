//! Timestamp type used throughout wicket.
//!
//! Timestamps are Unix epoch milliseconds (UTC). Session and promotion
//! expiry is sub-second business, so seconds are not enough resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64;
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Time remaining until this timestamp, zero if it has already passed.
    pub fn duration_until(&self, now: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(now.0))
    }

    /// Whether this timestamp is at or before `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.0 <= now.0
    }

    pub fn saturating_add(&self, d: Duration) -> Timestamp {
        Self(self.0.saturating_add(d.as_millis() as u64))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, d: Duration) -> Timestamp {
        self.saturating_add(d)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_inclusive() {
        let t = Timestamp::new(1_000);
        assert!(t.is_expired_at(Timestamp::new(1_000)));
        assert!(t.is_expired_at(Timestamp::new(1_001)));
        assert!(!t.is_expired_at(Timestamp::new(999)));
    }

    #[test]
    fn duration_until_saturates() {
        let t = Timestamp::new(500);
        assert_eq!(t.duration_until(Timestamp::new(200)), Duration::from_millis(300));
        assert_eq!(t.duration_until(Timestamp::new(500)), Duration::ZERO);
        assert_eq!(t.duration_until(Timestamp::new(900)), Duration::ZERO);
    }

    #[test]
    fn add_duration() {
        let t = Timestamp::new(100) + Duration::from_millis(250);
        assert_eq!(t.as_millis(), 350);
    }
}
