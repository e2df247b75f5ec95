use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROGRAM_TITLE: &str = "Unknown";
pub const DEFAULT_PROGRAM_DESCRIPTION: &str = "No description";
pub const DEFAULT_PROGRAM_CATEGORY: &str = "Uncategorized";

/// One scheduled broadcast from a guide feed
///
/// `start_time < end_time` is expected but not enforced; malformed feeds
/// can violate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Guide channel identifier, compared against `Channel::id`
    pub channel: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub category: String,
}

impl Program {
    /// Whether `now` falls inside the programme, both ends inclusive
    pub fn is_airing(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    pub fn starts_after(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }

    /// Elapsed share of the programme as a percentage in `0.0..=100.0`
    pub fn progress_percent(&self, now: DateTime<Utc>) -> f64 {
        let total = (self.end_time - self.start_time).num_milliseconds() as f64;
        let elapsed = (now - self.start_time).num_milliseconds() as f64;
        let fraction = elapsed / total;
        if !fraction.is_finite() {
            return 0.0;
        }
        fraction.clamp(0.0, 1.0) * 100.0
    }
}
