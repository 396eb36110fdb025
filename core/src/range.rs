//! History time ranges and the sparse axis labels drawn under the charts.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, TimeZone, Timelike};

use crate::error::ApiError;
use crate::types::HistoricalSnapshot;

/// Window of history requested from `/api/stats/history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Year,
    ];

    /// Wire value of the `range` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "24h",
            TimeRange::Week => "1w",
            TimeRange::Month => "1m",
            TimeRange::Year => "1y",
        }
    }

    /// Only every `label_stride()`-th point gets a label.
    pub fn label_stride(&self) -> usize {
        match self {
            TimeRange::Day | TimeRange::Year => 4,
            TimeRange::Week => 7,
            TimeRange::Month => 5,
        }
    }

    pub fn format_label<Tz: TimeZone>(&self, time: &chrono::DateTime<Tz>) -> String {
        match self {
            TimeRange::Day => format!("{}:00", time.hour()),
            TimeRange::Week | TimeRange::Month => format!("{}/{}", time.day(), time.month()),
            TimeRange::Year => format!("{}/{:02}", time.month(), time.year().rem_euclid(100)),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ApiError::InvalidInput(format!("unknown time range: {s}")))
    }
}

/// One label per snapshot, blank except on every `range.label_stride()`-th
/// index, rendered in `tz`.
pub fn chart_labels<Tz: TimeZone>(
    range: TimeRange,
    snapshots: &[HistoricalSnapshot],
    tz: &Tz,
) -> Vec<String> {
    let stride = range.label_stride();
    snapshots
        .iter()
        .enumerate()
        .map(|(i, snap)| {
            if i % stride == 0 {
                range.format_label(&snap.snapshot_time.with_timezone(tz))
            } else {
                String::new()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};

    fn hourly(count: usize) -> Vec<HistoricalSnapshot> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| HistoricalSnapshot {
                snapshot_time: start + Duration::hours(i as i64),
                total_nodes: None,
                incoming_nodes: Some(i as i64),
                archive_nodes: None,
                ipv4_nodes: None,
                ipv6_nodes: None,
                onion_nodes: None,
                top_software: None,
            })
            .collect()
    }

    #[test]
    fn wire_values() {
        let wire: Vec<&str> = TimeRange::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(wire, ["24h", "1w", "1m", "1y"]);
        for range in TimeRange::ALL {
            assert_eq!(range.as_str().parse::<TimeRange>().unwrap(), range);
        }
    }

    #[test]
    fn unknown_range_is_rejected() {
        assert!(matches!("2d".parse::<TimeRange>(), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn one_label_per_snapshot_with_blanks_between_marks() {
        let snaps = hourly(23);
        for range in TimeRange::ALL {
            let labels = chart_labels(range, &snaps, &Utc);
            assert_eq!(labels.len(), snaps.len());
            for (i, label) in labels.iter().enumerate() {
                assert_eq!(label.is_empty(), i % range.label_stride() != 0, "{range} index {i}");
            }
        }
    }

    #[test]
    fn day_labels_use_hours() {
        let labels = chart_labels(TimeRange::Day, &hourly(9), &Utc);
        assert_eq!(labels, ["0:00", "", "", "", "4:00", "", "", "", "8:00"]);
    }

    #[test]
    fn week_and_month_labels_use_day_and_month() {
        let snaps = hourly(1);
        assert_eq!(chart_labels(TimeRange::Week, &snaps, &Utc), ["1/3"]);
        assert_eq!(chart_labels(TimeRange::Month, &snaps, &Utc), ["1/3"]);
    }

    #[test]
    fn year_labels_use_two_digit_year() {
        assert_eq!(chart_labels(TimeRange::Year, &hourly(1), &Utc), ["3/24"]);
    }

    #[test]
    fn labels_follow_the_given_time_zone() {
        let tz = FixedOffset::west_opt(3600).unwrap();
        assert_eq!(chart_labels(TimeRange::Day, &hourly(1), &tz), ["23:00"]);
        assert_eq!(chart_labels(TimeRange::Week, &hourly(1), &tz), ["29/2"]);
    }
}
