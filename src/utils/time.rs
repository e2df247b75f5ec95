//! XMLTV timestamp parsing
//!
//! Guide feeds carry instants as `YYYYMMDDHHMMSS` optionally followed by a
//! timezone offset (`20240101120000 +0100`). The fixed-width date fields are
//! read explicitly; what happens to the offset is governed by
//! [`TimezonePolicy`].

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the offset suffix of an XMLTV timestamp is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimezonePolicy {
    /// Read the wall-clock fields as UTC and drop the suffix
    #[default]
    Ignore,
    /// Subtract the `±HHMM` suffix to get the true UTC instant
    Honor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    TooShort(String),
    NonNumeric(String),
    OutOfRange(String),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::TooShort(raw) => write!(f, "timestamp '{raw}' is shorter than 14 digits"),
            TimestampError::NonNumeric(raw) => write!(f, "timestamp '{raw}' has non-digit date fields"),
            TimestampError::OutOfRange(raw) => write!(f, "timestamp '{raw}' is not a valid date"),
        }
    }
}

impl std::error::Error for TimestampError {}

/// A parsed XMLTV timestamp: wall-clock fields plus the offset, if one was present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmltvTimestamp {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl XmltvTimestamp {
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .get(..14)
            .ok_or_else(|| TimestampError::TooShort(raw.to_string()))?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimestampError::NonNumeric(raw.to_string()));
        }

        let field = |range: std::ops::Range<usize>| -> u32 {
            digits[range].parse().unwrap_or_default()
        };
        let year = field(0..4) as i32;
        let (month, day) = (field(4..6), field(6..8));
        let (hour, minute, second) = (field(8..10), field(10..12), field(12..14));

        let local = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .ok_or_else(|| TimestampError::OutOfRange(raw.to_string()))?;

        Ok(Self {
            local,
            offset: parse_offset_suffix(&trimmed[14..]),
        })
    }

    pub fn to_utc(&self, policy: TimezonePolicy) -> DateTime<Utc> {
        let naive = match (policy, self.offset) {
            (TimezonePolicy::Honor, Some(offset)) => {
                self.local - Duration::seconds(offset.local_minus_utc() as i64)
            }
            _ => self.local,
        };
        naive.and_utc()
    }
}

/// Parse a timestamp straight to a UTC instant under `policy`
pub fn parse_xmltv_timestamp(
    raw: &str,
    policy: TimezonePolicy,
) -> Result<DateTime<Utc>, TimestampError> {
    XmltvTimestamp::parse(raw).map(|ts| ts.to_utc(policy))
}

/// `+0100`, `-0530`, ` +01:00`; anything else yields None
fn parse_offset_suffix(suffix: &str) -> Option<FixedOffset> {
    let suffix = suffix.trim();
    let sign = match suffix.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits: String = suffix[1..].chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_plain_timestamp() {
        let ts = XmltvTimestamp::parse("20240305143000").unwrap();
        assert_eq!(ts.offset, None);
        assert_eq!(
            ts.to_utc(TimezonePolicy::Ignore),
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_offset_ignored_by_default() {
        let instant = parse_xmltv_timestamp("20240305143000 +0200", TimezonePolicy::default()).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_offset_honored_when_requested() {
        let east = parse_xmltv_timestamp("20240305143000 +0200", TimezonePolicy::Honor).unwrap();
        assert_eq!(east, Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap());

        let west = parse_xmltv_timestamp("20240305233000 -0530", TimezonePolicy::Honor).unwrap();
        assert_eq!(west, Utc.with_ymd_and_hms(2024, 3, 6, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_honor_without_suffix_is_utc() {
        let instant = parse_xmltv_timestamp("20240305143000", TimezonePolicy::Honor).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_suffix_variants() {
        assert_eq!(
            XmltvTimestamp::parse("20240305143000+01:00").unwrap().offset,
            FixedOffset::east_opt(3600)
        );
        assert_eq!(XmltvTimestamp::parse("20240305143000 UTC").unwrap().offset, None);
        assert_eq!(XmltvTimestamp::parse("20240305143000 +9999").unwrap().offset, None);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            XmltvTimestamp::parse("2024030514"),
            Err(TimestampError::TooShort(_))
        ));
        assert!(matches!(
            XmltvTimestamp::parse("2024O305143000"),
            Err(TimestampError::NonNumeric(_))
        ));
        assert!(matches!(
            XmltvTimestamp::parse("20241305143000"),
            Err(TimestampError::OutOfRange(_))
        ));
        assert!(XmltvTimestamp::parse("").is_err());
    }
}
