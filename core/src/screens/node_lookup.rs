//! "Check a node": look up a user-typed address.

use super::{RequestGate, Ticket};
use crate::client::StatsClient;
use crate::http::{Exchange, HttpRequest};
use crate::types::NodeRecord;

pub const NOT_FOUND_MESSAGE: &str = "Node not found";
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching node details";

/// Result of the last lookup. `NotFound` (empty answer) and `Failed` (the
/// request itself failed) are separate on purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LookupOutcome {
    #[default]
    Idle,
    Loading,
    Found(NodeRecord),
    NotFound,
    Failed,
}

impl LookupOutcome {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            LookupOutcome::NotFound => Some(NOT_FOUND_MESSAGE),
            LookupOutcome::Failed => Some(FETCH_ERROR_MESSAGE),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct NodeLookupScreen {
    client: StatsClient,
    outcome: LookupOutcome,
    gate: RequestGate,
}

impl NodeLookupScreen {
    pub fn new(client: StatsClient) -> Self {
        Self {
            client,
            outcome: LookupOutcome::Idle,
            gate: RequestGate::default(),
        }
    }

    /// Start a lookup. Blank input is ignored. A new submission clears the
    /// previous result and supersedes any lookup still in flight.
    pub fn submit(&mut self, input: &str) -> Option<(Ticket, HttpRequest)> {
        let request = self.client.build_node_details(input).ok()?;
        self.outcome = LookupOutcome::Loading;
        Some((self.gate.begin(), request))
    }

    pub fn apply(&mut self, ticket: Ticket, exchange: Exchange) -> bool {
        if !self.gate.settle(ticket) {
            return false;
        }
        self.outcome = match exchange.and_then(|r| self.client.parse_node_details(r)) {
            Ok(Some(node)) => LookupOutcome::Found(node),
            Ok(None) => LookupOutcome::NotFound,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    transport = err.is_transport_class(),
                    "node lookup failed"
                );
                LookupOutcome::Failed
            }
        };
        true
    }

    pub fn close(&mut self) {
        self.gate.close();
    }

    pub fn outcome(&self) -> &LookupOutcome {
        &self.outcome
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.outcome, LookupOutcome::Loading)
    }
}
