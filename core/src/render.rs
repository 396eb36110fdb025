//! Plain-text rendering of the screens for terminal hosts.

use chrono::TimeZone;

use crate::range::TimeRange;
use crate::screens::{
    DetailOutcome, ListMode, LoadState, LookupOutcome, NodeDetailScreen, NodeListScreen,
    NodeLookupScreen, OverviewScreen,
};
use crate::trends::Series;
use crate::types::NodeRecord;

const NOT_AVAILABLE: &str = "N/A";

pub fn render_overview<Tz: TimeZone>(screen: &OverviewScreen, tz: &Tz) -> String {
    let Some(stats) = screen.stats() else {
        return match screen.state() {
            LoadState::Failed(msg) => msg.clone(),
            _ => "Loading...".to_string(),
        };
    };

    let mut lines = vec![
        "Bitcoin Network Overview".to_string(),
        String::new(),
        "Listening Nodes".to_string(),
        stats.incoming_nodes.to_string(),
        format!(
            "Total Nodes: {} (listening and no listening nodes)",
            stats.total_nodes
        ),
        String::new(),
        format!("{:<6}{:>10}    {:<6}{:>10}", "IPv4", stats.ipv4_nodes, "IPv6", stats.ipv6_nodes),
        format!("{:<6}{:>10}    {:<6}{:>10}", "Tor", stats.tor_nodes, "I2P", screen.i2p_nodes()),
        String::new(),
        range_selector(screen.range()),
    ];
    if let Some(msg) = screen.state().error_message() {
        lines.push(format!("! {msg}"));
    }

    lines.push(String::new());
    lines.push("Activity (Listening Nodes)".to_string());
    if screen.history().is_empty() {
        lines.push("No historical data available".to_string());
    } else {
        let labels = screen.labels(tz);
        let series = screen.listening_series();
        for (label, value) in labels.iter().zip(&series.points) {
            lines.push(format!("{label:>8} {value:>8}"));
        }
    }

    lines.push(String::new());
    lines.push("Top 5 Clients Trend".to_string());
    match screen.top_software_trend() {
        Some(trend) => lines.extend(trend.iter().map(series_line)),
        None => lines.push("No client data available".to_string()),
    }
    lines.join("\n")
}

fn range_selector(selected: TimeRange) -> String {
    TimeRange::ALL
        .iter()
        .map(|range| {
            let label = range.as_str().to_uppercase();
            if *range == selected {
                format!("[{label}]")
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn series_line(series: &Series) -> String {
    let points: Vec<String> = series.points.iter().map(i64::to_string).collect();
    let latest = series.points.last().copied().unwrap_or(0);
    format!("{} (now {latest}): {}", series.name, points.join(" "))
}

/// Missing and empty strings both show the placeholder.
pub fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value.as_deref().filter(|s| !s.is_empty()).unwrap_or(placeholder)
}

pub fn render_node_list(screen: &NodeListScreen) -> String {
    let mut lines = Vec::new();
    if let ListMode::Search(query) = screen.mode() {
        lines.push(format!("Search: {query}"));
    }
    lines.extend(screen.nodes().iter().map(|node| {
        format!(
            "{:<48} {:<32} {}",
            node.address,
            or_placeholder(&node.soft, "Unknown Agent"),
            or_placeholder(&node.country, "??")
        )
    }));
    match screen.state() {
        LoadState::Loading => lines.push("Loading...".to_string()),
        LoadState::Failed(msg) => lines.push(format!("! {msg}")),
        _ if screen.has_more() => lines.push(format!("-- page {} --", screen.page())),
        _ => {}
    }
    lines.join("\n")
}

pub fn render_node<Tz: TimeZone>(node: &NodeRecord, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let detected = node
        .detected
        .map(|t| t.with_timezone(tz).format("%Y-%m-%d %H:%M:%S %Z").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    [
        format!("Address: {}", node.address),
        format!("User Agent: {}", or_placeholder(&node.soft, NOT_AVAILABLE)),
        format!("Country: {}", or_placeholder(&node.country, NOT_AVAILABLE)),
        format!("Last Detected: {detected}"),
    ]
    .join("\n")
}

pub fn render_node_detail<Tz: TimeZone>(screen: &NodeDetailScreen, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match screen.outcome() {
        None => "Loading...".to_string(),
        Some(DetailOutcome::Found(node)) => render_node(node, tz),
        Some(DetailOutcome::NotFound | DetailOutcome::Failed) => "Node not found".to_string(),
    }
}

pub fn render_lookup<Tz: TimeZone>(screen: &NodeLookupScreen, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match screen.outcome() {
        LookupOutcome::Idle => String::new(),
        LookupOutcome::Loading => "Checking...".to_string(),
        LookupOutcome::Found(node) => render_node(node, tz),
        outcome => outcome.message().unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StatsClient;
    use crate::http::HttpResponse;
    use chrono::Utc;

    fn client() -> StatsClient {
        StatsClient::new("http://localhost:3000").unwrap()
    }

    #[test]
    fn overview_big_number_and_secondary_line() {
        let mut screen = OverviewScreen::new(client(), TimeRange::Day);
        let fetch = screen.mount();
        let stats =
            r#"{"incoming_nodes":100,"total_nodes":500,"ipv4_nodes":80,"ipv6_nodes":20,"tor_nodes":0}"#;
        screen.apply(
            fetch.ticket,
            Ok(HttpResponse::new(200, stats)),
            Ok(HttpResponse::new(200, "[]")),
            Ok(HttpResponse::new(200, "[]")),
        );

        let text = render_overview(&screen, &Utc);
        let lines: Vec<&str> = text.lines().collect();
        let title = lines.iter().position(|l| *l == "Listening Nodes").unwrap();
        assert_eq!(lines[title + 1], "100");
        assert_eq!(lines[title + 2], "Total Nodes: 500 (listening and no listening nodes)");
        assert!(text.contains("[24H] 1W 1M 1Y"));
        assert!(text.contains("No historical data available"));
        assert!(text.contains("No client data available"));
    }

    #[test]
    fn overview_before_first_load() {
        let mut screen = OverviewScreen::new(client(), TimeRange::Day);
        screen.mount();
        assert_eq!(render_overview(&screen, &Utc), "Loading...");
    }

    #[test]
    fn node_fields_fall_back_to_na() {
        let node = NodeRecord {
            address: "1.2.3.4".to_string(),
            soft: None,
            country: None,
            detected: None,
        };
        let text = render_node(&node, &Utc);
        assert_eq!(
            text,
            "Address: 1.2.3.4\nUser Agent: N/A\nCountry: N/A\nLast Detected: N/A"
        );
    }

    #[test]
    fn list_rows_use_placeholders() {
        let mut screen = NodeListScreen::new(client());
        let fetch = screen.mount().unwrap();
        screen.apply(fetch.ticket, Ok(HttpResponse::new(200, r#"[{"address":"1.2.3.4"}]"#)));
        let text = render_node_list(&screen);
        assert!(text.contains("Unknown Agent"));
        assert!(text.contains("??"));
    }

    #[test]
    fn empty_strings_use_placeholders() {
        let node = NodeRecord {
            address: "1.2.3.4".to_string(),
            soft: Some(String::new()),
            country: Some(String::new()),
            detected: None,
        };
        assert!(render_node(&node, &Utc).contains("User Agent: N/A\nCountry: N/A"));

        let mut screen = NodeListScreen::new(client());
        let fetch = screen.mount().unwrap();
        let body = r#"[{"address":"1.2.3.4","soft":"","country":""}]"#;
        screen.apply(fetch.ticket, Ok(HttpResponse::new(200, body)));
        let text = render_node_list(&screen);
        assert!(text.contains("Unknown Agent"));
        assert!(text.contains("??"));
    }

    #[test]
    fn lookup_messages() {
        let mut screen = NodeLookupScreen::new(client());
        let (ticket, _) = screen.submit("1.2.3.4").unwrap();
        assert_eq!(render_lookup(&screen, &Utc), "Checking...");
        screen.apply(ticket, Ok(HttpResponse::new(404, "")));
        assert_eq!(render_lookup(&screen, &Utc), "Node not found");
    }
}
