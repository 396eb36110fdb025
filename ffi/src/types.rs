//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.
//!
//! Arrays are handed out as boxed slices so the free functions can rebuild
//! them from `(ptr, len)` alone. An empty array is a null pointer with
//! length 0.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use crawlstats_core::error::ApiError;
use crawlstats_core::http::HttpMethod;
use crawlstats_core::types::{
    ClientCount, HistoricalSnapshot, NetworkStats, NodeRecord, ProtocolStat, SoftwareCount,
    SoftwareStat,
};

/// Opaque handle to a `StatsClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiStatsClient {
    pub(crate) inner: crawlstats_core::StatsClient,
}

// ---------------------------------------------------------------------------
// Ownership helpers
// ---------------------------------------------------------------------------

/// Interior NUL bytes cannot cross into C; such strings become empty.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn opt_c_string(s: Option<String>) -> *mut c_char {
    s.map(c_string).unwrap_or(std::ptr::null_mut())
}

pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

fn into_raw_array<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    (Box::into_raw(items.into_boxed_slice()) as *mut T, len)
}

/// Reclaim an array produced by `into_raw_array`.
///
/// # Safety
/// `ptr`/`len` must come from `into_raw_array` and not have been freed.
pub(crate) unsafe fn from_raw_array<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum. The crawler API is read-only.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `crawlstats_build_*` functions. The C caller executes the
/// request and passes the response back through `crawlstats_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: crawlstats_core::HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_array(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `crawlstats_parse_*` function. The FFI layer
/// reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// 404, or an empty answer from the node details endpoint.
    NotFound = 1,
    Http = 2,
    Deserialization = 3,
    Transport = 4,
    InvalidInput = 5,
    Panic = 6,
    NullArg = 7,
}

/// Tag that tells `crawlstats_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Stats = 1,
    NodeList = 2,
    Node = 3,
    ProtocolList = 4,
    SnapshotList = 5,
    SoftwareList = 6,
}

#[repr(C)]
pub struct FfiNetworkStats {
    pub total_nodes: i64,
    pub incoming_nodes: i64,
    pub ipv4_nodes: i64,
    pub ipv6_nodes: i64,
    pub tor_nodes: i64,
    pub archive_nodes: i64,
    pub core30_nodes: i64,
    pub knots_nodes: i64,
}

impl From<NetworkStats> for FfiNetworkStats {
    fn from(s: NetworkStats) -> Self {
        Self {
            total_nodes: s.total_nodes,
            incoming_nodes: s.incoming_nodes,
            ipv4_nodes: s.ipv4_nodes,
            ipv6_nodes: s.ipv6_nodes,
            tor_nodes: s.tor_nodes,
            archive_nodes: s.archive_nodes,
            core30_nodes: s.core30_nodes,
            knots_nodes: s.knots_nodes,
        }
    }
}

/// A crawled node. Optional fields are null when unknown; `detected` is an
/// RFC 3339 timestamp.
#[repr(C)]
pub struct FfiNode {
    pub address: *mut c_char,
    pub soft: *mut c_char,
    pub country: *mut c_char,
    pub detected: *mut c_char,
}

impl From<NodeRecord> for FfiNode {
    fn from(n: NodeRecord) -> Self {
        Self {
            address: c_string(n.address),
            soft: opt_c_string(n.soft),
            country: opt_c_string(n.country),
            detected: opt_c_string(n.detected.map(|t| t.to_rfc3339())),
        }
    }
}

impl FfiNode {
    pub(crate) fn free_fields(&self) {
        free_c_string(self.address);
        free_c_string(self.soft);
        free_c_string(self.country);
        free_c_string(self.detected);
    }
}

#[repr(C)]
pub struct FfiNodeList {
    pub items: *mut FfiNode,
    pub len: u32,
}

#[repr(C)]
pub struct FfiClientCount {
    pub client: *mut c_char,
    pub count: i64,
}

impl From<ClientCount> for FfiClientCount {
    fn from(c: ClientCount) -> Self {
        Self {
            client: opt_c_string(c.client),
            count: c.count,
        }
    }
}

#[repr(C)]
pub struct FfiProtocolStat {
    pub protocol: *mut c_char,
    pub total_nodes: i64,
    pub top_clients: *mut FfiClientCount,
    pub top_clients_len: u32,
}

impl From<ProtocolStat> for FfiProtocolStat {
    fn from(p: ProtocolStat) -> Self {
        let clients = p.top_clients.into_iter().map(FfiClientCount::from).collect();
        let (top_clients, top_clients_len) = into_raw_array(clients);
        Self {
            protocol: c_string(p.protocol),
            total_nodes: p.total_nodes,
            top_clients,
            top_clients_len,
        }
    }
}

impl FfiProtocolStat {
    pub(crate) fn free_fields(&self) {
        free_c_string(self.protocol);
        for client in unsafe { from_raw_array(self.top_clients, self.top_clients_len) } {
            free_c_string(client.client);
        }
    }
}

#[repr(C)]
pub struct FfiProtocolList {
    pub items: *mut FfiProtocolStat,
    pub len: u32,
}

#[repr(C)]
pub struct FfiSoftwareCount {
    pub soft: *mut c_char,
    pub node_count: i64,
}

impl From<SoftwareCount> for FfiSoftwareCount {
    fn from(s: SoftwareCount) -> Self {
        Self {
            soft: opt_c_string(s.soft),
            node_count: s.node_count,
        }
    }
}

/// One history sample. `snapshot_time` is seconds since the Unix epoch;
/// `incoming_nodes` is 0 when the crawler did not record it.
/// `has_top_software` is false when the breakdown is missing, which is not
/// the same as an empty breakdown.
#[repr(C)]
pub struct FfiSnapshot {
    pub snapshot_time: i64,
    pub incoming_nodes: i64,
    pub has_top_software: bool,
    pub top_software: *mut FfiSoftwareCount,
    pub top_software_len: u32,
}

impl From<HistoricalSnapshot> for FfiSnapshot {
    fn from(s: HistoricalSnapshot) -> Self {
        let has_top_software = s.top_software.is_some();
        let software = s
            .top_software
            .unwrap_or_default()
            .into_iter()
            .map(FfiSoftwareCount::from)
            .collect();
        let (top_software, top_software_len) = into_raw_array(software);
        Self {
            snapshot_time: s.snapshot_time.timestamp(),
            incoming_nodes: s.incoming_nodes.unwrap_or(0),
            has_top_software,
            top_software,
            top_software_len,
        }
    }
}

impl FfiSnapshot {
    pub(crate) fn free_fields(&self) {
        for entry in unsafe { from_raw_array(self.top_software, self.top_software_len) } {
            free_c_string(entry.soft);
        }
    }
}

#[repr(C)]
pub struct FfiSnapshotList {
    pub items: *mut FfiSnapshot,
    pub len: u32,
}

/// `node_count` is 0 when the crawler reported none.
#[repr(C)]
pub struct FfiSoftwareStat {
    pub soft: *mut c_char,
    pub node_count: i64,
}

impl From<SoftwareStat> for FfiSoftwareStat {
    fn from(s: SoftwareStat) -> Self {
        Self {
            soft: opt_c_string(s.soft),
            node_count: s.node_count.unwrap_or(0),
        }
    }
}

#[repr(C)]
pub struct FfiSoftwareList {
    pub items: *mut FfiSoftwareStat,
    pub len: u32,
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

/// Box a list of converted items as `{ items, len }` built by `make`.
fn boxed_list<T, U, L>(items: Vec<T>, make: impl FnOnce(*mut U, u32) -> L) -> *mut c_void
where
    U: From<T>,
{
    let (ptr, len) = into_raw_array(items.into_iter().map(U::from).collect());
    Box::into_raw(Box::new(make(ptr, len))) as *mut c_void
}

impl FfiResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn error(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_stats(stats: NetworkStats) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiNetworkStats::from(stats)));
        Self::ok(FfiDataTag::Stats, data as *mut c_void)
    }

    pub(crate) fn ok_node(node: NodeRecord) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiNode::from(node)));
        Self::ok(FfiDataTag::Node, data as *mut c_void)
    }

    pub(crate) fn ok_node_list(nodes: Vec<NodeRecord>) -> *mut Self {
        let data = boxed_list::<_, FfiNode, _>(nodes, |items, len| FfiNodeList { items, len });
        Self::ok(FfiDataTag::NodeList, data)
    }

    pub(crate) fn ok_protocol_list(stats: Vec<ProtocolStat>) -> *mut Self {
        let data = boxed_list::<_, FfiProtocolStat, _>(stats, |items, len| FfiProtocolList {
            items,
            len,
        });
        Self::ok(FfiDataTag::ProtocolList, data)
    }

    pub(crate) fn ok_snapshot_list(history: Vec<HistoricalSnapshot>) -> *mut Self {
        let data = boxed_list::<_, FfiSnapshot, _>(history, |items, len| FfiSnapshotList {
            items,
            len,
        });
        Self::ok(FfiDataTag::SnapshotList, data)
    }

    pub(crate) fn ok_software_list(stats: Vec<SoftwareStat>) -> *mut Self {
        let data = boxed_list::<_, FfiSoftwareStat, _>(stats, |items, len| FfiSoftwareList {
            items,
            len,
        });
        Self::ok(FfiDataTag::SoftwareList, data)
    }

    /// The crawler does not know the requested node.
    pub(crate) fn node_not_found(http_status: u16) -> *mut Self {
        Self::error(FfiErrorCode::NotFound, http_status, "node not found".to_string())
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::NotFound => (FfiErrorCode::NotFound, 404u16),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::InvalidInput(_) => (FfiErrorCode::InvalidInput, 0),
        };
        Self::error(error_code, http_status, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg.to_string())
    }
}
