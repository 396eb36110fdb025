//! Synchronous client core for the crawler statistics dashboard.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and drives the dashboard
//! screens as view-models fed with those responses. The host executes the
//! actual HTTP round-trips, making the core fully deterministic and testable.
//!
//! # Design
//! - `StatsClient` is stateless; it holds only the base URL.
//! - Each endpoint is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit.
//! - Screens stamp every fetch with a `Ticket`; late or superseded responses
//!   are dropped, which stands in for request cancellation.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod range;
pub mod render;
pub mod screens;
pub mod trends;
pub mod types;

pub use client::{StatsClient, DEFAULT_PAGE_LIMIT};
pub use error::ApiError;
pub use http::{Exchange, HttpMethod, HttpRequest, HttpResponse};
pub use range::{chart_labels, TimeRange};
pub use trends::{listening_series, top_software_trend, Series};
pub use types::{
    protocol_total, ClientCount, HistoricalSnapshot, NetworkStats, NodeRecord, ProtocolStat,
    SoftwareCount, SoftwareStat,
};
