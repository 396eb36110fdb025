//! C-ABI wrapper around `crawlstats-core`.
//!
//! # Overview
//! Exposes the crawler stats API through `extern "C"` functions so any
//! language with a C FFI can build requests and parse responses without
//! linking to serde or chrono directly. The screens stay on the Rust side of
//! hosts that link the core crate; C hosts drive the client alone.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-endpoint `build_*` / `parse_*` mirrors the core API 1:1.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly. An unknown node is
//!   reported as `NotFound`, since C has no `Option`.
//! - The C caller owns all returned pointers and must call the matching
//!   `crawlstats_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::str::FromStr;

use crawlstats_core::error::ApiError;
use crawlstats_core::http::HttpResponse;
use crawlstats_core::{StatsClient, TimeRange};

use types::*;

/// Borrow a caller-provided C string. Invalid UTF-8 reads as empty.
fn read_c_str<'a>(s: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(s) }.to_str().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `StatsClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or not an http(s) URL, or if an
/// internal panic occurs.
/// The caller must free the returned pointer with `crawlstats_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_client_new(base_url: *const c_char) -> *mut FfiStatsClient {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        match StatsClient::new(read_c_str(base_url)) {
            Ok(inner) => Box::into_raw(Box::new(FfiStatsClient { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `StatsClient` created by `crawlstats_client_new`. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_client_free(client: *mut FfiStatsClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a request that takes no arguments besides the client.
fn build_simple(
    client: *const FfiStatsClient,
    build: fn(&StatsClient) -> crawlstats_core::HttpRequest,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(build(&client.inner))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for the headline counters.
///
/// Returns null if `client` is null.
/// The caller must free the returned pointer with `crawlstats_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_build_stats(client: *const FfiStatsClient) -> *mut FfiHttpRequest {
    build_simple(client, StatsClient::build_stats)
}

/// Build an HTTP request for one page of recently scanned nodes.
///
/// Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_build_recent_nodes(
    client: *const FfiStatsClient,
    limit: u32,
    page: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_recent_nodes(limit, page))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for a single node by address.
///
/// Returns null if `client` or `address` is null, or if `address` is blank.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_build_node_details(
    client: *const FfiStatsClient,
    address: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || address.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.inner.build_node_details(read_c_str(address)) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for the full agent breakdown.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_build_software_stats(
    client: *const FfiStatsClient,
) -> *mut FfiHttpRequest {
    build_simple(client, StatsClient::build_software_stats)
}

/// Build an HTTP request for the per-protocol listening counts.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_build_incoming_stats(
    client: *const FfiStatsClient,
) -> *mut FfiHttpRequest {
    build_simple(client, StatsClient::build_incoming_stats)
}

/// Build an HTTP request for the history of one time range.
///
/// `range` is one of `"24h"`, `"1w"`, `"1m"`, `"1y"`.
/// Returns null if `client` or `range` is null, or if `range` is unknown.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_build_history(
    client: *const FfiStatsClient,
    range: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || range.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match TimeRange::from_str(read_c_str(range)) {
            Ok(range) => FfiHttpRequest::from_core(client.inner.build_history(range)),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an HTTP request for a node search.
///
/// Returns null if `client` or `query` is null, or if `query` is blank.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_build_search_nodes(
    client: *const FfiStatsClient,
    query: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || query.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.inner.build_search_nodes(read_c_str(query)) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty. Invalid UTF-8 is decoded lossily so a garbled body
/// still fails to parse instead of reading as an empty answer.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        String::from_utf8_lossy(unsafe { CStr::from_ptr(resp.body) }.to_bytes()).into_owned()
    };
    HttpResponse::new(resp.status, body)
}

/// Shared null checks and panic guard for every `crawlstats_parse_*`.
fn parse_with<T>(
    op: &str,
    client: *const FfiStatsClient,
    response: *const FfiHttpResponse,
    parse: fn(&StatsClient, HttpResponse) -> Result<T, ApiError>,
    wrap: fn(T) -> *mut FfiResult,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match parse(&client.inner, ffi_response_to_core(resp)) {
            Ok(value) => wrap(value),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic(&format!("panic in crawlstats_parse_{op}")))
}

/// Parse an HTTP response from a stats request.
///
/// Returns a result with `data_tag = Stats` on success.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_parse_stats(
    client: *const FfiStatsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with("stats", client, response, StatsClient::parse_stats, FfiResult::ok_stats)
}

/// Parse an HTTP response from a recent-nodes request.
///
/// Returns a result with `data_tag = NodeList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_parse_recent_nodes(
    client: *const FfiStatsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(
        "recent_nodes",
        client,
        response,
        StatsClient::parse_recent_nodes,
        FfiResult::ok_node_list,
    )
}

/// Parse an HTTP response from a node-details request.
///
/// Returns a result with `data_tag = Node` on success. A node the crawler
/// does not know (404, empty body, `null` or `{}`) yields
/// `error_code = NotFound` with the response status in `http_status`.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_parse_node_details(
    client: *const FfiStatsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_node_details(ffi_response_to_core(resp)) {
            Ok(Some(node)) => FfiResult::ok_node(node),
            Ok(None) => FfiResult::node_not_found(resp.status),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in crawlstats_parse_node_details"))
}

/// Parse an HTTP response from a software-stats request.
///
/// Returns a result with `data_tag = SoftwareList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_parse_software_stats(
    client: *const FfiStatsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(
        "software_stats",
        client,
        response,
        StatsClient::parse_software_stats,
        FfiResult::ok_software_list,
    )
}

/// Parse an HTTP response from an incoming-stats request.
///
/// Returns a result with `data_tag = ProtocolList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_parse_incoming_stats(
    client: *const FfiStatsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(
        "incoming_stats",
        client,
        response,
        StatsClient::parse_incoming_stats,
        FfiResult::ok_protocol_list,
    )
}

/// Parse an HTTP response from a history request.
///
/// Returns a result with `data_tag = SnapshotList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_parse_history(
    client: *const FfiStatsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(
        "history",
        client,
        response,
        StatsClient::parse_history,
        FfiResult::ok_snapshot_list,
    )
}

/// Parse an HTTP response from a search request.
///
/// Returns a result with `data_tag = NodeList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_parse_search_nodes(
    client: *const FfiStatsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(
        "search_nodes",
        client,
        response,
        StatsClient::parse_search_nodes,
        FfiResult::ok_node_list,
    )
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `crawlstats_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        for h in unsafe { from_raw_array(req.headers, req.headers_len) } {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    });
}

/// Free an `FfiResult` returned by any `crawlstats_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Stats => {
                drop(unsafe { Box::from_raw(result.data as *mut FfiNetworkStats) });
            }
            FfiDataTag::Node => {
                let node = unsafe { Box::from_raw(result.data as *mut FfiNode) };
                node.free_fields();
            }
            FfiDataTag::NodeList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiNodeList) };
                for node in unsafe { from_raw_array(list.items, list.len) } {
                    node.free_fields();
                }
            }
            FfiDataTag::ProtocolList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiProtocolList) };
                for stat in unsafe { from_raw_array(list.items, list.len) } {
                    stat.free_fields();
                }
            }
            FfiDataTag::SnapshotList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiSnapshotList) };
                for snapshot in unsafe { from_raw_array(list.items, list.len) } {
                    snapshot.free_fields();
                }
            }
            FfiDataTag::SoftwareList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiSoftwareList) };
                for stat in unsafe { from_raw_array(list.items, list.len) } {
                    free_c_string(stat.soft);
                }
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn crawlstats_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
