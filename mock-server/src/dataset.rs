//! Deterministic in-memory stand-in for the crawler database.

use chrono::{DateTime, Datelike, Duration, DurationRound, Months, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Hourly snapshots kept by the sample dataset.
pub const SAMPLE_HISTORY_HOURS: i64 = 366 * 24;
pub const SAMPLE_NODE_COUNT: usize = 137;

const AGENTS: [&str; 7] = [
    "/Satoshi:27.0.0/",
    "/Satoshi:26.1.0/",
    "/Satoshi:28.1.0/",
    "/Satoshi:25.0.0/",
    "/Satoshi:27.1.0(Knots:20240801)/",
    "/Satoshi:30.0.0/",
    "/btcd:0.24.2/",
];

const COUNTRIES: [&str; 8] = ["US", "DE", "FR", "NL", "CA", "GB", "JP", "CH"];

/// One row of the crawler's node table.
#[derive(Debug, Clone)]
pub struct NodeRow {
    pub address: String,
    /// `ipv4`, `ipv6`, `onionv2`, `onionv3`, `i2p`, `cjdns` or `yggdrasil`.
    pub network: String,
    pub incoming: bool,
    pub archive: bool,
    pub soft: Option<String>,
    pub country: Option<String>,
    pub detected: Option<DateTime<Utc>>,
    pub scanned: Option<DateTime<Utc>>,
}

impl NodeRow {
    pub fn is_onion(&self) -> bool {
        matches!(self.network.as_str(), "onionv2" | "onionv3")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoftwareCount {
    pub soft: Option<String>,
    pub node_count: i64,
}

/// One row of the hourly aggregate table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyStat {
    pub snapshot_time: DateTime<Utc>,
    pub total_nodes: Option<i64>,
    pub incoming_nodes: Option<i64>,
    pub archive_nodes: Option<i64>,
    pub ipv4_nodes: Option<i64>,
    pub ipv6_nodes: Option<i64>,
    pub onion_nodes: Option<i64>,
    pub top_software: Option<Vec<SoftwareCount>>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    /// Clock the history windows are measured against.
    pub now: DateTime<Utc>,
    pub nodes: Vec<NodeRow>,
    /// Oldest first.
    pub snapshots: Vec<HourlyStat>,
}

impl Dataset {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            now,
            nodes: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// A fixed population of nodes and one year of hourly snapshots ending
    /// at `now`.
    pub fn sample(now: DateTime<Utc>) -> Self {
        let nodes = (0..SAMPLE_NODE_COUNT).map(|i| sample_node(i, now)).collect();

        let last_hour = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
        let snapshots = (0..SAMPLE_HISTORY_HOURS)
            .rev()
            .map(|ago| sample_snapshot(last_hour - Duration::hours(ago), ago))
            .collect();

        Self {
            now,
            nodes,
            snapshots,
        }
    }

    pub fn find_node(&self, address: &str) -> Option<&NodeRow> {
        self.nodes.iter().find(|n| n.address == address)
    }

    /// Snapshots inside `range` (`24h`, `1w`, `1m`, `1y`; anything else is
    /// treated as `24h`), thinned out for the longer windows.
    pub fn history(&self, range: &str) -> Vec<HourlyStat> {
        let (since, keep): (Option<DateTime<Utc>>, fn(&DateTime<Utc>) -> bool) = match range {
            "1w" => (Some(self.now - Duration::days(7)), every_six_hours),
            "1m" => (self.now.checked_sub_months(Months::new(1)), midnight),
            "1y" => (self.now.checked_sub_months(Months::new(12)), sunday_midnight),
            _ => (Some(self.now - Duration::hours(24)), every_hour),
        };
        let since = since.unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.snapshots
            .iter()
            .filter(|s| s.snapshot_time > since && keep(&s.snapshot_time))
            .cloned()
            .collect()
    }
}

fn every_hour(_: &DateTime<Utc>) -> bool {
    true
}

fn every_six_hours(t: &DateTime<Utc>) -> bool {
    t.hour() % 6 == 0
}

fn midnight(t: &DateTime<Utc>) -> bool {
    t.hour() == 0
}

fn sunday_midnight(t: &DateTime<Utc>) -> bool {
    t.weekday() == Weekday::Sun && t.hour() == 0
}

fn sample_node(i: usize, now: DateTime<Utc>) -> NodeRow {
    let network = match i % 10 {
        0..=4 => "ipv4",
        5 | 6 => "ipv6",
        7 => "onionv3",
        8 => "i2p",
        _ if i % 20 == 9 => "cjdns",
        _ => "yggdrasil",
    };
    let address = match network {
        "ipv4" => format!("198.51.{}.{}", i / 256, i % 256),
        "ipv6" => format!("2001:db8::{i:x}"),
        "onionv3" => format!("mock{i:03}hiddenservice.onion"),
        "i2p" => format!("mock{i:03}.b32.i2p"),
        "cjdns" => format!("fc00::{i:x}"),
        _ => format!("200:db8::{i:x}"),
    };
    let clearnet = matches!(network, "ipv4" | "ipv6");
    NodeRow {
        address,
        network: network.to_string(),
        incoming: i % 3 != 0,
        archive: i % 4 == 0,
        soft: (i % 11 != 0).then(|| AGENTS[(i * 5 + i / 3) % AGENTS.len()].to_string()),
        country: clearnet.then(|| COUNTRIES[i % COUNTRIES.len()].to_string()),
        detected: Some(now - Duration::minutes(17 * i as i64)),
        scanned: (i % 9 != 4).then(|| now - Duration::minutes(13 * i as i64)),
    }
}

fn sample_snapshot(at: DateTime<Utc>, hours_ago: i64) -> HourlyStat {
    let daily = (at.hour() as i64 - 12).abs() * 15;
    let drift = (SAMPLE_HISTORY_HOURS - hours_ago) / 24;
    let incoming = 8_000 + drift * 3 + daily;

    // A few rows predate the agent breakdown column.
    let top_software = (hours_ago % 97 != 50).then(|| {
        AGENTS
            .iter()
            .enumerate()
            .map(|(rank, agent)| SoftwareCount {
                soft: Some(agent.to_string()),
                node_count: (incoming / (rank as i64 + 2)) - ((hours_ago + rank as i64) % 40),
            })
            .collect()
    });

    HourlyStat {
        snapshot_time: at,
        total_nodes: Some(incoming * 3),
        incoming_nodes: Some(incoming),
        archive_nodes: Some(incoming / 5),
        ipv4_nodes: Some(incoming * 6 / 10),
        ipv6_nodes: Some(incoming * 2 / 10),
        onion_nodes: Some(incoming * 2 / 10),
        top_software,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn sample_is_deterministic() {
        let a = Dataset::sample(now());
        let b = Dataset::sample(now());
        assert_eq!(a.nodes.len(), SAMPLE_NODE_COUNT);
        assert_eq!(a.nodes[42].address, b.nodes[42].address);
        assert_eq!(a.snapshots.len() as i64, SAMPLE_HISTORY_HOURS);
        assert_eq!(
            a.snapshots.last().unwrap().snapshot_time,
            Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn snapshots_are_oldest_first() {
        let data = Dataset::sample(now());
        assert!(data.snapshots.windows(2).all(|w| w[0].snapshot_time < w[1].snapshot_time));
    }

    #[test]
    fn day_history_keeps_every_hour() {
        assert_eq!(Dataset::sample(now()).history("24h").len(), 24);
    }

    #[test]
    fn week_history_keeps_six_hourly_points() {
        let history = Dataset::sample(now()).history("1w");
        assert_eq!(history.len(), 28);
        assert!(history.iter().all(|s| s.snapshot_time.hour() % 6 == 0));
    }

    #[test]
    fn month_and_year_history_keep_midnights() {
        let data = Dataset::sample(now());
        let month = data.history("1m");
        assert_eq!(month.len(), 31);
        assert!(month.iter().all(|s| s.snapshot_time.hour() == 0));

        let year = data.history("1y");
        assert!((52..=53).contains(&year.len()));
        assert!(year.iter().all(|s| s.snapshot_time.weekday() == Weekday::Sun));
    }

    #[test]
    fn unknown_range_falls_back_to_day() {
        assert_eq!(Dataset::sample(now()).history("bogus").len(), 24);
    }
}
