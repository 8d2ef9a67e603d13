use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_REVISE_INTERVAL_HOURS: i64 = 24;

/// Decides when a word committed as "not yet learned" comes back for review.
pub trait IntervalPolicy: Send + Sync {
    fn next_revise(&self, level: u32, now: DateTime<Utc>) -> DateTime<Utc>;
}

/// Same delay for every level. `level` is tracked by the store but does not
/// stretch the interval.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::hours(DEFAULT_REVISE_INTERVAL_HOURS)
    }
}

impl IntervalPolicy for FixedInterval {
    fn next_revise(&self, _level: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.interval
    }
}
