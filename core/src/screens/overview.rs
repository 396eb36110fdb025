//! Network overview: headline counts, protocol split and history charts.

use chrono::TimeZone;

use super::{LoadState, RequestGate, Ticket};
use crate::client::StatsClient;
use crate::error::ApiError;
use crate::http::{Exchange, HttpRequest};
use crate::range::{chart_labels, TimeRange};
use crate::trends::{self, Series};
use crate::types::{protocol_total, HistoricalSnapshot, NetworkStats, ProtocolStat};

pub const LOAD_FAILED_MESSAGE: &str = "Unable to load network statistics";
pub const INVALID_ADDRESS_MESSAGE: &str = "Please enter a valid address";

/// The three requests the host must run concurrently and hand back together.
#[derive(Debug, Clone)]
pub struct OverviewFetch {
    pub ticket: Ticket,
    pub stats: HttpRequest,
    pub history: HttpRequest,
    pub incoming: HttpRequest,
}

#[derive(Debug)]
pub struct OverviewScreen {
    client: StatsClient,
    range: TimeRange,
    state: LoadState,
    refreshing: bool,
    stats: Option<NetworkStats>,
    history: Vec<HistoricalSnapshot>,
    i2p_nodes: i64,
    gate: RequestGate,
}

impl OverviewScreen {
    pub fn new(client: StatsClient, range: TimeRange) -> Self {
        Self {
            client,
            range,
            state: LoadState::Idle,
            refreshing: false,
            stats: None,
            history: Vec::new(),
            i2p_nodes: 0,
            gate: RequestGate::default(),
        }
    }

    pub fn mount(&mut self) -> OverviewFetch {
        self.fetch()
    }

    /// Switch the history window. Selecting the current range does nothing.
    pub fn select_range(&mut self, range: TimeRange) -> Option<OverviewFetch> {
        if range == self.range {
            return None;
        }
        self.range = range;
        Some(self.fetch())
    }

    /// Pull-to-refresh: reload everything for the current range.
    pub fn refresh(&mut self) -> OverviewFetch {
        self.refreshing = true;
        self.fetch()
    }

    fn fetch(&mut self) -> OverviewFetch {
        self.state = LoadState::Loading;
        OverviewFetch {
            ticket: self.gate.begin(),
            stats: self.client.build_stats(),
            history: self.client.build_history(self.range),
            incoming: self.client.build_incoming_stats(),
        }
    }

    /// Join the three results. Any failure fails the whole batch and keeps
    /// the previously shown data. Returns whether the results were applied.
    pub fn apply(
        &mut self,
        ticket: Ticket,
        stats: Exchange,
        history: Exchange,
        incoming: Exchange,
    ) -> bool {
        if !self.gate.settle(ticket) {
            return false;
        }
        self.refreshing = false;

        match self.join(stats, history, incoming) {
            Ok((stats, history, incoming)) => {
                self.i2p_nodes = protocol_total(&incoming, "i2p");
                self.stats = Some(stats);
                self.history = history;
                self.state = LoadState::Loaded;
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    transport = err.is_transport_class(),
                    range = %self.range,
                    "failed to load overview"
                );
                self.state = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    fn join(
        &self,
        stats: Exchange,
        history: Exchange,
        incoming: Exchange,
    ) -> Result<(NetworkStats, Vec<HistoricalSnapshot>, Vec<ProtocolStat>), ApiError> {
        Ok((
            self.client.parse_stats(stats?)?,
            self.client.parse_history(history?)?,
            self.client.parse_incoming_stats(incoming?)?,
        ))
    }

    pub fn close(&mut self) {
        self.gate.close();
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn stats(&self) -> Option<&NetworkStats> {
        self.stats.as_ref()
    }

    pub fn history(&self) -> &[HistoricalSnapshot] {
        &self.history
    }

    pub fn i2p_nodes(&self) -> i64 {
        self.i2p_nodes
    }

    pub fn labels<Tz: TimeZone>(&self, tz: &Tz) -> Vec<String> {
        chart_labels(self.range, &self.history, tz)
    }

    pub fn listening_series(&self) -> Series {
        trends::listening_series(&self.history)
    }

    pub fn top_software_trend(&self) -> Option<Vec<Series>> {
        trends::top_software_trend(&self.history)
    }
}

/// Address to open in the detail screen from the overview's check box.
pub fn check_node_target(input: &str) -> Result<String, ApiError> {
    let address = input.trim();
    if address.is_empty() {
        return Err(ApiError::InvalidInput(INVALID_ADDRESS_MESSAGE.to_string()));
    }
    Ok(address.to_string())
}
