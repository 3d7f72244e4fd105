//! Relative time range filters.
//!
//! The dashboard offers a fixed menu of "N unit ago" labels. Labels are
//! validated against that menu; anything else is rejected instead of being
//! parsed loosely.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mention::Timestamp;

/// Label outside the supported relative range vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid time range: {label:?}")]
pub struct InvalidRangeError {
    pub label: String,
}

/// One of the supported relative time filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelativeRange {
    OneHour,
    SixHours,
    TwelveHours,
    OneDay,
    TwoDays,
    ThreeDays,
}

impl RelativeRange {
    /// Every supported range, shortest first.
    pub const ALL: [RelativeRange; 6] = [
        RelativeRange::OneHour,
        RelativeRange::SixHours,
        RelativeRange::TwelveHours,
        RelativeRange::OneDay,
        RelativeRange::TwoDays,
        RelativeRange::ThreeDays,
    ];

    /// Display label, e.g. `"12 hours ago"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneHour => "1 hours ago",
            Self::SixHours => "6 hours ago",
            Self::TwelveHours => "12 hours ago",
            Self::OneDay => "1 days ago",
            Self::TwoDays => "2 days ago",
            Self::ThreeDays => "3 days ago",
        }
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        match self {
            Self::OneHour => Duration::hours(1),
            Self::SixHours => Duration::hours(6),
            Self::TwelveHours => Duration::hours(12),
            Self::OneDay => Duration::days(1),
            Self::TwoDays => Duration::days(2),
            Self::ThreeDays => Duration::days(3),
        }
    }

    /// Absolute lower bound of the window ending at `now`.
    pub fn start_from(&self, now: Timestamp) -> Timestamp {
        now - self.duration()
    }
}

impl fmt::Display for RelativeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RelativeRange {
    type Err = InvalidRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|range| range.label() == s)
            .ok_or_else(|| InvalidRangeError {
                label: s.to_string(),
            })
    }
}

impl TryFrom<String> for RelativeRange {
    type Error = InvalidRangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelativeRange> for String {
    fn from(value: RelativeRange) -> Self {
        value.label().to_string()
    }
}

/// Format a timestamp the way the backend expects (`2024-05-01T00:00:00.000Z`).
pub fn to_iso(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Resolve a relative range label against an explicit `now`.
pub fn resolve_at(label: &str, now: Timestamp) -> Result<String, InvalidRangeError> {
    let range: RelativeRange = label.parse()?;
    Ok(to_iso(range.start_from(now)))
}

/// Resolve a relative range label against the current time.
pub fn resolve(label: &str) -> Result<String, InvalidRangeError> {
    resolve_at(label, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_resolve_twelve_hours() {
        let resolved = resolve_at("12 hours ago", now()).unwrap();
        assert_eq!(resolved, "2024-05-02T00:00:00.000Z");
    }

    #[test]
    fn test_resolve_days() {
        assert_eq!(
            resolve_at("3 days ago", now()).unwrap(),
            "2024-04-29T12:00:00.000Z"
        );
        assert_eq!(
            resolve_at("1 days ago", now()).unwrap(),
            "2024-05-01T12:00:00.000Z"
        );
    }

    #[test]
    fn test_every_label_round_trips() {
        for range in RelativeRange::ALL {
            let parsed: RelativeRange = range.label().parse().unwrap();
            assert_eq!(parsed, range);
            assert!(resolve_at(range.label(), now()).is_ok());
        }
    }

    #[test]
    fn test_rejects_unknown_labels() {
        for label in [
            "bad input",
            "",
            "12 hour ago",
            "24 hours ago",
            "4 days ago",
            " 1 hours ago",
            "1 HOURS AGO",
            "1 weeks ago",
        ] {
            let err = resolve_at(label, now()).unwrap_err();
            assert_eq!(err.label, label);
        }
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&RelativeRange::SixHours).unwrap();
        assert_eq!(json, r#""6 hours ago""#);
        let parsed: RelativeRange = serde_json::from_str(r#""2 days ago""#).unwrap();
        assert_eq!(parsed, RelativeRange::TwoDays);
        assert!(serde_json::from_str::<RelativeRange>(r#""yesterday""#).is_err());
    }

    #[test]
    fn test_resolve_uses_current_time() {
        let before = Utc::now();
        let resolved = resolve("1 hours ago").unwrap();
        let parsed = chrono::DateTime::parse_from_rfc3339(&resolved)
            .unwrap()
            .with_timezone(&Utc);
        assert!(parsed <= Utc::now() - Duration::hours(1));
        assert!(parsed >= before - Duration::hours(1) - Duration::milliseconds(1));
    }
}
