//! Paginated list of recently scanned nodes with free-text search.

use super::{LoadState, RequestGate, Ticket};
use crate::client::StatsClient;
use crate::error::ApiError;
use crate::http::{Exchange, HttpRequest};
use crate::types::NodeRecord;

pub const PAGE_SIZE: u32 = crate::client::DEFAULT_PAGE_LIMIT;
pub const LOAD_FAILED_MESSAGE: &str = "Unable to load nodes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMode {
    Browse,
    /// Single-shot search; pagination is off until the query is cleared.
    Search(String),
}

#[derive(Debug, Clone)]
pub struct ListFetch {
    pub ticket: Ticket,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Page { page: u32, replace: bool },
    Search,
}

#[derive(Debug)]
pub struct NodeListScreen {
    client: StatsClient,
    nodes: Vec<NodeRecord>,
    page: u32,
    has_more: bool,
    mode: ListMode,
    state: LoadState,
    pending: Option<Pending>,
    gate: RequestGate,
}

impl NodeListScreen {
    pub fn new(client: StatsClient) -> Self {
        Self {
            client,
            nodes: Vec::new(),
            page: 1,
            has_more: true,
            mode: ListMode::Browse,
            state: LoadState::Idle,
            pending: None,
            gate: RequestGate::default(),
        }
    }

    pub fn mount(&mut self) -> Option<ListFetch> {
        self.load_page(1, false)
    }

    /// End of list reached. Only paginates in browse mode, when the last page
    /// was full and nothing is loading.
    pub fn load_more(&mut self) -> Option<ListFetch> {
        if !self.has_more || self.gate.in_flight() || self.mode != ListMode::Browse {
            return None;
        }
        self.load_page(self.page + 1, false)
    }

    /// Pull-to-refresh: re-run the search, or reload page 1.
    pub fn refresh(&mut self) -> Option<ListFetch> {
        match self.mode.clone() {
            ListMode::Search(query) => self.search(query),
            ListMode::Browse => self.load_page(1, true),
        }
    }

    /// A blank query leaves search mode and reloads page 1.
    pub fn submit_search(&mut self, query: &str) -> Option<ListFetch> {
        let query = query.trim();
        if query.is_empty() {
            self.mode = ListMode::Browse;
            return self.load_page(1, true);
        }
        self.mode = ListMode::Search(query.to_string());
        self.search(query.to_string())
    }

    fn load_page(&mut self, page: u32, replace: bool) -> Option<ListFetch> {
        if matches!(self.pending, Some(Pending::Page { .. })) && self.gate.in_flight() {
            tracing::debug!(page, "page load already in flight");
            return None;
        }
        let request = self.client.build_recent_nodes(PAGE_SIZE, page);
        Some(self.start(Pending::Page { page, replace }, request))
    }

    fn search(&mut self, query: String) -> Option<ListFetch> {
        match self.client.build_search_nodes(&query) {
            Ok(request) => Some(self.start(Pending::Search, request)),
            Err(err) => {
                tracing::warn!(error = %err, "search not sent");
                None
            }
        }
    }

    fn start(&mut self, pending: Pending, request: HttpRequest) -> ListFetch {
        self.state = LoadState::Loading;
        self.pending = Some(pending);
        ListFetch {
            ticket: self.gate.begin(),
            request,
        }
    }

    pub fn apply(&mut self, ticket: Ticket, exchange: Exchange) -> bool {
        if !self.gate.settle(ticket) {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };

        let result = exchange.and_then(|response| match pending {
            Pending::Page { .. } => self.client.parse_recent_nodes(response),
            Pending::Search => self.client.parse_search_nodes(response),
        });
        match result {
            Ok(nodes) => {
                self.receive(pending, nodes);
                self.state = LoadState::Loaded;
            }
            Err(err) => self.fail(pending, err),
        }
        true
    }

    fn receive(&mut self, pending: Pending, nodes: Vec<NodeRecord>) {
        match pending {
            Pending::Page { page, replace } => {
                self.has_more = nodes.len() == PAGE_SIZE as usize;
                if replace {
                    self.nodes = nodes;
                } else {
                    self.nodes.extend(nodes);
                }
                self.page = page;
            }
            Pending::Search => {
                self.nodes = nodes;
                self.has_more = false;
            }
        }
    }

    fn fail(&mut self, pending: Pending, err: ApiError) {
        tracing::error!(
            error = %err,
            transport = err.is_transport_class(),
            ?pending,
            "failed to load node list"
        );
        self.state = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
    }

    pub fn close(&mut self) {
        self.gate.close();
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn mode(&self) -> &ListMode {
        &self.mode
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Pull-to-refresh spinner: shown while page 1 or a search is in
    /// flight, never for a next-page load.
    pub fn is_refreshing(&self) -> bool {
        self.gate.in_flight()
            && matches!(
                self.pending,
                Some(Pending::Page { page: 1, .. }) | Some(Pending::Search)
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;

    fn screen() -> NodeListScreen {
        NodeListScreen::new(StatsClient::new("http://localhost:3000").unwrap())
    }

    fn page_body(start: usize, count: usize) -> Exchange {
        let nodes: Vec<NodeRecord> = (start..start + count)
            .map(|i| NodeRecord {
                address: format!("10.0.0.{i}"),
                soft: None,
                country: None,
                detected: None,
            })
            .collect();
        Ok(HttpResponse::new(200, serde_json::to_string(&nodes).unwrap()))
    }

    #[test]
    fn mount_requests_first_page() {
        let mut screen = screen();
        let fetch = screen.mount().unwrap();
        assert_eq!(fetch.request.url, "http://localhost:3000/api/nodes?limit=20&page=1");
        assert!(screen.is_refreshing());
    }

    #[test]
    fn pages_append_until_a_short_page() {
        let mut screen = screen();
        let fetch = screen.mount().unwrap();
        screen.apply(fetch.ticket, page_body(0, 20));
        assert_eq!(screen.nodes().len(), 20);
        assert!(screen.has_more());

        let fetch = screen.load_more().unwrap();
        assert_eq!(fetch.request.url, "http://localhost:3000/api/nodes?limit=20&page=2");
        screen.apply(fetch.ticket, page_body(20, 7));
        assert_eq!(screen.nodes().len(), 27);
        assert_eq!(screen.nodes()[20].address, "10.0.0.20");
        assert_eq!(screen.page(), 2);
        assert!(!screen.has_more());
        assert!(screen.load_more().is_none());
    }

    #[test]
    fn load_more_is_refused_while_loading() {
        let mut screen = screen();
        screen.mount().unwrap();
        assert!(screen.load_more().is_none());
    }

    #[test]
    fn refresh_replaces_from_page_one() {
        let mut screen = screen();
        let fetch = screen.mount().unwrap();
        screen.apply(fetch.ticket, page_body(0, 20));
        let fetch = screen.load_more().unwrap();
        screen.apply(fetch.ticket, page_body(20, 20));

        let fetch = screen.refresh().unwrap();
        assert_eq!(fetch.request.url, "http://localhost:3000/api/nodes?limit=20&page=1");
        screen.apply(fetch.ticket, page_body(100, 3));
        assert_eq!(screen.nodes().len(), 3);
        assert_eq!(screen.page(), 1);
    }

    #[test]
    fn next_page_load_is_not_a_refresh() {
        let mut screen = screen();
        let fetch = screen.mount().unwrap();
        screen.apply(fetch.ticket, page_body(0, 20));
        assert!(!screen.is_refreshing());

        let fetch = screen.load_more().unwrap();
        assert!(!screen.is_refreshing());
        screen.apply(fetch.ticket, page_body(20, 20));
        assert!(!screen.is_refreshing());
    }

    #[test]
    fn refresh_from_a_later_page_shows_spinner() {
        let mut screen = screen();
        let fetch = screen.mount().unwrap();
        screen.apply(fetch.ticket, page_body(0, 20));
        let fetch = screen.load_more().unwrap();
        screen.apply(fetch.ticket, page_body(20, 20));
        assert_eq!(screen.page(), 2);

        let fetch = screen.refresh().unwrap();
        assert!(screen.is_refreshing());
        screen.apply(fetch.ticket, page_body(0, 20));
        assert!(!screen.is_refreshing());
    }

    #[test]
    fn search_replaces_list_and_disables_pagination() {
        let mut screen = screen();
        let fetch = screen.mount().unwrap();
        screen.apply(fetch.ticket, page_body(0, 20));

        let fetch = screen.submit_search("  Satoshi ").unwrap();
        assert_eq!(fetch.request.url, "http://localhost:3000/api/nodes/search?q=Satoshi");
        assert_eq!(screen.mode(), &ListMode::Search("Satoshi".to_string()));
        screen.apply(fetch.ticket, page_body(50, 2));

        assert_eq!(screen.nodes().len(), 2);
        assert!(!screen.has_more());
        assert!(screen.load_more().is_none());

        let fetch = screen.refresh().unwrap();
        assert_eq!(fetch.request.url, "http://localhost:3000/api/nodes/search?q=Satoshi");
    }

    #[test]
    fn blank_search_returns_to_browsing() {
        let mut screen = screen();
        let fetch = screen.submit_search("knots").unwrap();
        screen.apply(fetch.ticket, page_body(0, 1));

        let fetch = screen.submit_search("   ").unwrap();
        assert_eq!(screen.mode(), &ListMode::Browse);
        assert_eq!(fetch.request.url, "http://localhost:3000/api/nodes?limit=20&page=1");
        screen.apply(fetch.ticket, page_body(0, 20));
        assert_eq!(screen.nodes().len(), 20);
        assert!(screen.has_more());
    }

    #[test]
    fn blank_search_supersedes_a_pending_search() {
        let mut screen = screen();
        let search = screen.submit_search("knots").unwrap();
        let browse = screen.submit_search("").unwrap();
        assert!(!screen.apply(search.ticket, page_body(0, 1)));
        assert!(screen.apply(browse.ticket, page_body(0, 4)));
        assert_eq!(screen.nodes().len(), 4);
    }

    #[test]
    fn failed_page_keeps_existing_nodes() {
        let mut screen = screen();
        let fetch = screen.mount().unwrap();
        screen.apply(fetch.ticket, page_body(0, 20));
        let fetch = screen.load_more().unwrap();
        screen.apply(fetch.ticket, Ok(HttpResponse::new(500, "")));

        assert_eq!(screen.nodes().len(), 20);
        assert_eq!(screen.page(), 1);
        assert_eq!(screen.state().error_message(), Some(LOAD_FAILED_MESSAGE));
        assert!(screen.load_more().is_some());
    }
}
