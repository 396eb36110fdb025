//! Chart series derived from the history endpoint.
//!
//! The overview draws two line charts: listening nodes over time, and the
//! per-agent trend of the five agents that lead the most recent snapshot.

use crate::types::HistoricalSnapshot;

/// Number of agents plotted in the client trend chart.
pub const TOP_SOFTWARE_LIMIT: usize = 5;

pub const LISTENING_SERIES_NAME: &str = "Listening Nodes";

/// RGB colours assigned to trend series by position.
pub const SERIES_PALETTE: [(u8, u8, u8); TOP_SOFTWARE_LIMIT] = [
    (255, 99, 132),
    (54, 162, 235),
    (255, 206, 86),
    (75, 192, 192),
    (153, 102, 255),
];

/// A named line with one point per snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub points: Vec<i64>,
    pub color: (u8, u8, u8),
}

pub fn listening_series(history: &[HistoricalSnapshot]) -> Series {
    Series {
        name: LISTENING_SERIES_NAME.to_string(),
        points: history.iter().map(|s| s.incoming_nodes.unwrap_or(0)).collect(),
        color: (44, 44, 44),
    }
}

/// Per-agent series for the leading agents of the latest snapshot.
///
/// Returns `None` when there is no history or the latest snapshot carries no
/// agent list. Earlier snapshots that lack an agent contribute 0.
pub fn top_software_trend(history: &[HistoricalSnapshot]) -> Option<Vec<Series>> {
    let leaders = history.last()?.top_software.as_deref()?;

    let series = leaders
        .iter()
        .take(TOP_SOFTWARE_LIMIT)
        .enumerate()
        .map(|(index, leader)| Series {
            name: leader.soft.clone().unwrap_or_else(|| "unknown".to_string()),
            points: history
                .iter()
                .map(|snap| snap.software_count(leader.soft.as_deref()))
                .collect(),
            color: SERIES_PALETTE[index % SERIES_PALETTE.len()],
        })
        .collect();
    Some(series)
}
