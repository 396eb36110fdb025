pub mod dataset;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub use dataset::{Dataset, HourlyStat, NodeRow, SoftwareCount};

/// Protocols reported individually by `/api/incoming_stats`; onion v2/v3 are
/// folded into a trailing `onion` entry.
pub const SIMPLE_PROTOCOLS: [&str; 5] = ["ipv4", "ipv6", "i2p", "cjdns", "yggdrasil"];
pub const SEARCH_LIMIT: usize = 50;
const TOP_CLIENTS: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    pub total_nodes: i64,
    pub incoming_nodes: i64,
    pub archive_nodes: i64,
    pub ipv4_nodes: i64,
    pub ipv6_nodes: i64,
    pub tor_nodes: i64,
    pub core30_nodes: i64,
    pub knots_nodes: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeInfo {
    pub address: String,
    pub soft: Option<String>,
    pub country: Option<String>,
    pub detected: Option<DateTime<Utc>>,
}

impl From<&NodeRow> for NodeInfo {
    fn from(row: &NodeRow) -> Self {
        Self {
            address: row.address.clone(),
            soft: row.soft.clone(),
            country: row.country.clone(),
            detected: row.detected,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientCount {
    pub client: Option<String>,
    pub count: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtocolStats {
    pub protocol: String,
    pub total_nodes: i64,
    pub top_clients: Vec<ClientCount>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoftwareVersionStat {
    pub soft: Option<String>,
    pub node_count: Option<i64>,
}

#[derive(Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub range: Option<String>,
}

pub type Db = Arc<Dataset>;

/// Router over the sample dataset anchored at the current time.
pub fn app() -> Router {
    app_with(Dataset::sample(Utc::now()))
}

pub fn app_with(dataset: Dataset) -> Router {
    let db: Db = Arc::new(dataset);
    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/nodes", get(get_recent_nodes))
        .route("/api/node/{address}", get(find_node))
        .route("/api/software_stats", get(get_software_stats))
        .route("/api/incoming_stats", get(get_incoming_stats))
        .route("/api/stats/history", get(get_historical_stats))
        .route("/api/nodes/search", get(search_nodes))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, dataset: Dataset) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(dataset)).await
}

async fn get_stats(State(db): State<Db>) -> Json<Stats> {
    let listening = || db.nodes.iter().filter(|n| n.incoming);
    let count = |pred: &dyn Fn(&NodeRow) -> bool| listening().filter(|&n| pred(n)).count() as i64;

    Json(Stats {
        total_nodes: db.nodes.len() as i64,
        incoming_nodes: listening().count() as i64,
        archive_nodes: count(&|n| n.archive),
        ipv4_nodes: count(&|n| n.network == "ipv4"),
        ipv6_nodes: count(&|n| n.network == "ipv6"),
        tor_nodes: count(&|n| n.is_onion()),
        core30_nodes: count(&|n| n.soft.as_deref().is_some_and(|s| s.starts_with("/Satoshi:30"))),
        knots_nodes: count(&|n| n.soft.as_deref().is_some_and(|s| s.contains("Knots"))),
    })
}

async fn get_recent_nodes(
    State(db): State<Db>,
    Query(params): Query<PaginationParams>,
) -> Json<Vec<NodeInfo>> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100) as usize;
    let page = params.page.unwrap_or(1).max(1) as usize;
    let offset = (page - 1).saturating_mul(limit);

    let mut scanned: Vec<&NodeRow> = db.nodes.iter().filter(|n| n.scanned.is_some()).collect();
    scanned.sort_by(|a, b| b.scanned.cmp(&a.scanned));
    tracing::debug!(page, limit, total = scanned.len(), "listing recent nodes");

    Json(scanned.into_iter().skip(offset).take(limit).map(NodeInfo::from).collect())
}

async fn find_node(
    State(db): State<Db>,
    Path(address): Path<String>,
) -> Result<Json<NodeInfo>, StatusCode> {
    tracing::debug!(%address, "looking up node");
    db.find_node(&address)
        .map(|row| Json(NodeInfo::from(row)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_software_stats(State(db): State<Db>) -> Json<Vec<SoftwareVersionStat>> {
    let counts = group_agents(db.nodes.iter().filter(|n| n.incoming));
    Json(
        counts
            .into_iter()
            .map(|(soft, count)| SoftwareVersionStat {
                soft: Some(soft),
                node_count: Some(count),
            })
            .collect(),
    )
}

async fn get_incoming_stats(State(db): State<Db>) -> Json<Vec<ProtocolStats>> {
    let breakdown = |pred: &dyn Fn(&NodeRow) -> bool, protocol: &str| {
        let rows: Vec<&NodeRow> = db.nodes.iter().filter(|&n| n.incoming && pred(n)).collect();
        ProtocolStats {
            protocol: protocol.to_string(),
            total_nodes: rows.len() as i64,
            top_clients: group_agents(rows.into_iter())
                .into_iter()
                .take(TOP_CLIENTS)
                .map(|(client, count)| ClientCount {
                    client: Some(client),
                    count,
                })
                .collect(),
        }
    };

    let mut stats: Vec<ProtocolStats> = SIMPLE_PROTOCOLS
        .iter()
        .map(|&proto| breakdown(&|n| n.network == proto, proto))
        .collect();
    stats.push(breakdown(&|n| n.is_onion(), "onion"));
    Json(stats)
}

async fn get_historical_stats(
    State(db): State<Db>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<HourlyStat>> {
    let range = params.range.unwrap_or_else(|| "24h".to_string());
    let history = db.history(&range);
    tracing::debug!(%range, points = history.len(), "serving history");
    Json(history)
}

async fn search_nodes(
    State(db): State<Db>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<NodeInfo>> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Json(Vec::new());
    }
    let needle = query.to_lowercase();
    let matches = |value: &str| value.to_lowercase().contains(&needle);

    let mut found: Vec<&NodeRow> = db
        .nodes
        .iter()
        .filter(|n| matches(&n.address) || n.soft.as_deref().is_some_and(|s| matches(s)))
        .collect();
    // Most recent first, undetected rows last.
    found.sort_by(|a, b| match (a.detected, b.detected) {
        (Some(a), Some(b)) => b.cmp(&a),
        (a, b) => b.is_some().cmp(&a.is_some()),
    });
    tracing::debug!(%query, hits = found.len(), "searching nodes");

    Json(found.into_iter().take(SEARCH_LIMIT).map(NodeInfo::from).collect())
}

/// Non-empty agents with their node counts, most common first.
fn group_agents<'a>(rows: impl Iterator<Item = &'a NodeRow>) -> Vec<(String, i64)> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for soft in rows.filter_map(|n| n.soft.as_deref()).filter(|s| !s.is_empty()) {
        *counts.entry(soft).or_default() += 1;
    }
    let mut counts: Vec<(String, i64)> = counts
        .into_iter()
        .map(|(soft, count)| (soft.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(address: &str, network: &str, incoming: bool, soft: Option<&str>) -> NodeRow {
        NodeRow {
            address: address.to_string(),
            network: network.to_string(),
            incoming,
            archive: false,
            soft: soft.map(str::to_string),
            country: None,
            detected: None,
            scanned: None,
        }
    }

    #[test]
    fn group_agents_orders_by_count_then_name() {
        let rows = [
            row("a", "ipv4", true, Some("/B/")),
            row("b", "ipv4", true, Some("/A/")),
            row("c", "ipv4", true, Some("/B/")),
            row("d", "ipv4", true, Some("")),
            row("e", "ipv4", true, None),
            row("f", "ipv4", true, Some("/C/")),
        ];
        let grouped = group_agents(rows.iter());
        assert_eq!(
            grouped,
            vec![("/B/".to_string(), 2), ("/A/".to_string(), 1), ("/C/".to_string(), 1)]
        );
    }

    #[test]
    fn node_info_serializes_detected_as_rfc3339() {
        let mut r = row("1.2.3.4", "ipv4", true, None);
        r.detected = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        let json = serde_json::to_value(NodeInfo::from(&r)).unwrap();
        assert_eq!(json["detected"], "2024-01-02T03:04:05Z");
        assert_eq!(json["soft"], serde_json::Value::Null);
    }

    #[test]
    fn stats_deserializes_from_wire_names() {
        let stats: Stats = serde_json::from_str(
            r#"{"total_nodes":3,"incoming_nodes":2,"archive_nodes":0,"ipv4_nodes":1,
                "ipv6_nodes":1,"tor_nodes":0,"core30_nodes":0,"knots_nodes":0}"#,
        )
        .unwrap();
        assert_eq!(stats.incoming_nodes, 2);
    }
}
