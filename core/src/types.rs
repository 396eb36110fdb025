//! Domain DTOs for the crawler stats API.
//!
//! # Design
//! These types mirror the crawler's JSON schema but are defined independently
//! from the mock-server crate; integration tests catch schema drift. Fields
//! the dashboard does not strictly need are optional or defaulted so that an
//! older or newer crawler still parses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Point-in-time node counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkStats {
    pub total_nodes: i64,
    pub incoming_nodes: i64,
    pub ipv4_nodes: i64,
    pub ipv6_nodes: i64,
    pub tor_nodes: i64,
    #[serde(default)]
    pub archive_nodes: i64,
    #[serde(default)]
    pub core30_nodes: i64,
    #[serde(default)]
    pub knots_nodes: i64,
}

/// How many listening nodes advertised a given user agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoftwareCount {
    pub soft: Option<String>,
    pub node_count: i64,
}

/// One sample of the crawler's hourly aggregate table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoricalSnapshot {
    pub snapshot_time: DateTime<Utc>,
    #[serde(default)]
    pub total_nodes: Option<i64>,
    #[serde(default)]
    pub incoming_nodes: Option<i64>,
    #[serde(default)]
    pub archive_nodes: Option<i64>,
    #[serde(default)]
    pub ipv4_nodes: Option<i64>,
    #[serde(default)]
    pub ipv6_nodes: Option<i64>,
    #[serde(default)]
    pub onion_nodes: Option<i64>,
    /// Ordered most common first. `None` when the crawler stored null or
    /// anything that is not a list of counts.
    #[serde(default, deserialize_with = "lenient_software_list")]
    pub top_software: Option<Vec<SoftwareCount>>,
}

impl HistoricalSnapshot {
    /// Node count for `soft` in this snapshot, 0 when not listed.
    pub fn software_count(&self, soft: Option<&str>) -> i64 {
        self.top_software
            .as_deref()
            .and_then(|list| list.iter().find(|s| s.soft.as_deref() == soft))
            .map(|s| s.node_count)
            .unwrap_or(0)
    }
}

fn lenient_software_list<'de, D>(deserializer: D) -> Result<Option<Vec<SoftwareCount>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientCount {
    pub client: Option<String>,
    pub count: i64,
}

/// Listening nodes reachable through one overlay/transport protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtocolStat {
    pub protocol: String,
    pub total_nodes: i64,
    #[serde(default)]
    pub top_clients: Vec<ClientCount>,
}

/// Total for `protocol` in a protocol breakdown, 0 when the crawler did not
/// report it.
pub fn protocol_total(stats: &[ProtocolStat], protocol: &str) -> i64 {
    stats
        .iter()
        .find(|s| s.protocol == protocol)
        .map(|s| s.total_nodes)
        .unwrap_or(0)
}

/// A single peer as known to the crawler, keyed by `address`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeRecord {
    pub address: String,
    #[serde(default)]
    pub soft: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub detected: Option<DateTime<Utc>>,
}

/// Full agent breakdown from `/api/software_stats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoftwareStat {
    pub soft: Option<String>,
    pub node_count: Option<i64>,
}
