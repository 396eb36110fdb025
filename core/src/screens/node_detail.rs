//! Detail page for a node reached by navigation (list row or overview box).

use super::{LoadState, RequestGate, Ticket};
use crate::client::StatsClient;
use crate::error::ApiError;
use crate::http::{Exchange, HttpRequest};
use crate::types::NodeRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Found(NodeRecord),
    NotFound,
    Failed,
}

#[derive(Debug)]
pub struct NodeDetailScreen {
    client: StatsClient,
    address: Option<String>,
    outcome: Option<DetailOutcome>,
    state: LoadState,
    gate: RequestGate,
}

impl NodeDetailScreen {
    pub fn new(client: StatsClient) -> Self {
        Self {
            client,
            address: None,
            outcome: None,
            state: LoadState::Idle,
            gate: RequestGate::default(),
        }
    }

    /// Navigate to `address`. Re-opening the address already shown does not
    /// refetch.
    pub fn open(&mut self, address: &str) -> Result<Option<(Ticket, HttpRequest)>, ApiError> {
        let address = address.trim();
        if self.address.as_deref() == Some(address) {
            return Ok(None);
        }
        let request = self.client.build_node_details(address)?;
        self.address = Some(address.to_string());
        self.outcome = None;
        self.state = LoadState::Loading;
        Ok(Some((self.gate.begin(), request)))
    }

    pub fn apply(&mut self, ticket: Ticket, exchange: Exchange) -> bool {
        if !self.gate.settle(ticket) {
            return false;
        }
        let outcome = match exchange.and_then(|r| self.client.parse_node_details(r)) {
            Ok(Some(node)) => DetailOutcome::Found(node),
            Ok(None) => DetailOutcome::NotFound,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    transport = err.is_transport_class(),
                    address = ?self.address,
                    "failed to fetch node"
                );
                DetailOutcome::Failed
            }
        };
        self.state = match outcome {
            DetailOutcome::Failed => LoadState::Failed("Error fetching node details".to_string()),
            _ => LoadState::Loaded,
        };
        self.outcome = Some(outcome);
        true
    }

    pub fn close(&mut self) {
        self.gate.close();
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn outcome(&self) -> Option<&DetailOutcome> {
        self.outcome.as_ref()
    }

    pub fn node(&self) -> Option<&NodeRecord> {
        match &self.outcome {
            Some(DetailOutcome::Found(node)) => Some(node),
            _ => None,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }
}
