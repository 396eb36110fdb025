//! Terminal host for the crawler dashboard.
//!
//! Executes the screens' requests over HTTP and prints the rendered screens.

mod transport;

use std::thread;

use anyhow::{anyhow, bail, Context};
use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use crawlstats_core::render::{
    or_placeholder, render_lookup, render_node_detail, render_node_list, render_overview,
};
use crawlstats_core::screens::overview::check_node_target;
use crawlstats_core::screens::{
    LoadState, LookupOutcome, NodeDetailScreen, NodeListScreen, NodeLookupScreen, OverviewFetch,
    OverviewScreen,
};
use crawlstats_core::{ApiError, Exchange, StatsClient, TimeRange};
use tracing_subscriber::EnvFilter;

use transport::Transport;

#[derive(Parser, Debug)]
#[command(name = "crawlstats", about = "Bitcoin node crawler statistics")]
struct Cli {
    /// Base URL of the crawler API.
    #[arg(
        long,
        env = "CRAWLSTATS_API_URL",
        default_value = "http://localhost:3000"
    )]
    base_url: String,

    /// Hours east of UTC used for chart labels and timestamps.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    tz_offset: i32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline counts, protocol split and history charts.
    Overview {
        /// One of 24h, 1w, 1m, 1y.
        #[arg(long, default_value = "24h")]
        range: TimeRange,
    },
    /// Recently scanned nodes, or search results.
    Nodes {
        /// Number of pages to load.
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Search by address or user agent instead of browsing.
        #[arg(long)]
        search: Option<String>,
    },
    /// Open a node's detail page.
    Node { address: String },
    /// Check whether the crawler knows an address.
    Check { address: String },
    /// Every listening user agent, most common first.
    Software,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let tz = cli
        .tz_offset
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow!("tz offset out of range: {}", cli.tz_offset))?;
    let client = StatsClient::new(&cli.base_url).context("invalid --base-url")?;
    let transport = Transport::new();
    tracing::debug!(base_url = client.base_url(), command = ?cli.command, "starting");

    match cli.command {
        Command::Overview { range } => overview(client, &transport, range, &tz),
        Command::Nodes { pages, search } => nodes(client, &transport, pages, search.as_deref()),
        Command::Node { address } => node(client, &transport, &address, &tz),
        Command::Check { address } => check(client, &transport, &address, &tz),
        Command::Software => software(&client, &transport),
    }
}

/// Run the three overview requests at once and join them.
fn fetch_overview(transport: &Transport, fetch: OverviewFetch) -> (Exchange, Exchange, Exchange) {
    let OverviewFetch {
        stats,
        history,
        incoming,
        ..
    } = fetch;
    thread::scope(|s| {
        let stats = s.spawn(|| transport.execute(stats));
        let history = s.spawn(|| transport.execute(history));
        let incoming = s.spawn(|| transport.execute(incoming));
        let join = |handle: thread::ScopedJoinHandle<'_, Exchange>| {
            handle
                .join()
                .unwrap_or_else(|_| Err(ApiError::Transport("request thread panicked".to_string())))
        };
        (join(stats), join(history), join(incoming))
    })
}

fn overview(
    client: StatsClient,
    transport: &Transport,
    range: TimeRange,
    tz: &FixedOffset,
) -> anyhow::Result<()> {
    let mut screen = OverviewScreen::new(client, range);
    let fetch = screen.mount();
    let ticket = fetch.ticket;
    let (stats, history, incoming) = fetch_overview(transport, fetch);
    screen.apply(ticket, stats, history, incoming);

    println!("{}", render_overview(&screen, tz));
    fail_on(screen.state())
}

fn nodes(
    client: StatsClient,
    transport: &Transport,
    pages: u32,
    search: Option<&str>,
) -> anyhow::Result<()> {
    let mut screen = NodeListScreen::new(client);
    let mut next = match search {
        Some(query) => screen.submit_search(query),
        None => screen.mount(),
    };
    let mut loaded = 0;
    while let Some(fetch) = next {
        screen.apply(fetch.ticket, transport.execute(fetch.request));
        loaded += 1;
        if loaded >= pages || matches!(screen.state(), LoadState::Failed(_)) {
            break;
        }
        next = screen.load_more();
    }

    println!("{}", render_node_list(&screen));
    fail_on(screen.state())
}

fn node(
    client: StatsClient,
    transport: &Transport,
    address: &str,
    tz: &FixedOffset,
) -> anyhow::Result<()> {
    let address = check_node_target(address)?;
    let mut screen = NodeDetailScreen::new(client);
    if let Some((ticket, request)) = screen.open(&address)? {
        screen.apply(ticket, transport.execute(request));
    }

    println!("{}", render_node_detail(&screen, tz));
    fail_on(screen.state())
}

fn check(
    client: StatsClient,
    transport: &Transport,
    address: &str,
    tz: &FixedOffset,
) -> anyhow::Result<()> {
    let mut screen = NodeLookupScreen::new(client);
    let Some((ticket, request)) = screen.submit(address) else {
        bail!("nothing to look up");
    };
    screen.apply(ticket, transport.execute(request));

    println!("{}", render_lookup(&screen, tz));
    if let LookupOutcome::Failed = screen.outcome() {
        bail!("{}", screen.outcome().message().unwrap_or("lookup failed"));
    }
    Ok(())
}

fn software(client: &StatsClient, transport: &Transport) -> anyhow::Result<()> {
    let response = transport.execute(client.build_software_stats())?;
    for stat in client.parse_software_stats(response)? {
        println!(
            "{:>8}  {}",
            stat.node_count.unwrap_or(0),
            or_placeholder(&stat.soft, "Unknown Agent")
        );
    }
    Ok(())
}

fn fail_on(state: &LoadState) -> anyhow::Result<()> {
    match state.error_message() {
        Some(msg) => bail!("{msg}"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_overview_range_and_negative_offset() {
        let cli = Cli::try_parse_from([
            "crawlstats",
            "--base-url",
            "http://crawler.local",
            "--tz-offset",
            "-5",
            "overview",
            "--range",
            "1w",
        ])
        .unwrap();
        assert_eq!(cli.base_url, "http://crawler.local");
        assert_eq!(cli.tz_offset, -5);
        assert!(matches!(cli.command, Command::Overview { range: TimeRange::Week }));
    }

    #[test]
    fn rejects_unknown_range() {
        assert!(Cli::try_parse_from(["crawlstats", "overview", "--range", "2w"]).is_err());
    }

    #[test]
    fn nodes_defaults_to_one_page() {
        let cli = Cli::try_parse_from(["crawlstats", "nodes", "--search", "knots"]).unwrap();
        match cli.command {
            Command::Nodes { pages, search } => {
                assert_eq!(pages, 1);
                assert_eq!(search.as_deref(), Some("knots"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn unreachable_client() -> StatsClient {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        StatsClient::new(&format!("http://{addr}")).unwrap()
    }

    #[test]
    fn check_fails_when_the_api_is_unreachable() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let err = check(unreachable_client(), &Transport::new(), "198.51.0.2", &tz).unwrap_err();
        assert_eq!(err.to_string(), "Error fetching node details");
    }

    #[test]
    fn node_fails_when_the_api_is_unreachable() {
        let tz = FixedOffset::east_opt(0).unwrap();
        assert!(node(unreachable_client(), &Transport::new(), "198.51.0.2", &tz).is_err());
    }
}
