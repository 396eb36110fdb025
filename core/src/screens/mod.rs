//! Sans-IO view-models for the dashboard screens.
//!
//! # Design
//! Each screen owns its view state and hands out requests for the host to
//! execute. Every fetch is stamped with a `Ticket` from the screen's
//! `RequestGate`; responses come back with that ticket and are dropped if a
//! newer fetch was started or the screen was closed in the meantime. This
//! binds cancellation to the screen lifecycle without the host having to
//! abort anything.

pub mod node_detail;
pub mod node_list;
pub mod node_lookup;
pub mod overview;

pub use node_detail::{DetailOutcome, NodeDetailScreen};
pub use node_list::{ListFetch, ListMode, NodeListScreen, PAGE_SIZE};
pub use node_lookup::{LookupOutcome, NodeLookupScreen};
pub use overview::{OverviewFetch, OverviewScreen};

/// Stamp attached to an in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Issues tickets and decides whether a response is still wanted.
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: u64,
    in_flight: bool,
    closed: bool,
}

impl RequestGate {
    pub fn begin(&mut self) -> Ticket {
        self.latest += 1;
        self.in_flight = true;
        Ticket(self.latest)
    }

    /// Consume `ticket` if it is the latest one and the screen is open.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.closed {
            tracing::debug!(generation = ticket.0, "dropping response for closed screen");
            return false;
        }
        if ticket.0 != self.latest || !self.in_flight {
            tracing::debug!(
                generation = ticket.0,
                latest = self.latest,
                "dropping stale response"
            );
            return false;
        }
        self.in_flight = false;
        true
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight && !self.closed
    }

    /// Tear down: every outstanding and future ticket is rejected.
    pub fn close(&mut self) {
        self.closed = true;
        self.in_flight = false;
    }
}

/// Lifecycle of a screen's data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_ticket_wins() {
        let mut gate = RequestGate::default();
        let first = gate.begin();
        let second = gate.begin();
        assert!(!gate.settle(first));
        assert!(gate.settle(second));
        assert!(!gate.in_flight());
    }

    #[test]
    fn ticket_settles_once() {
        let mut gate = RequestGate::default();
        let ticket = gate.begin();
        assert!(gate.settle(ticket));
        assert!(!gate.settle(ticket));
    }

    #[test]
    fn closed_gate_rejects_everything() {
        let mut gate = RequestGate::default();
        let ticket = gate.begin();
        gate.close();
        assert!(!gate.settle(ticket));
        let late = gate.begin();
        assert!(!gate.settle(late));
        assert!(!gate.in_flight());
    }
}
