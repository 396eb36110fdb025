//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or error kinds. Comparing deserialized values
//! (not raw strings) avoids false negatives from field-ordering differences.

use crawlstats_core::{
    ApiError, HistoricalSnapshot, HttpMethod, HttpRequest, HttpResponse, NetworkStats,
    NodeRecord, ProtocolStat, StatsClient, TimeRange,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> StatsClient {
    StatsClient::new(BASE_URL).unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        other => panic!("unknown method: {other}"),
    }
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(sim["status"].as_u64().unwrap() as u16, sim["body"].as_str().unwrap())
}

fn assert_error_kind(name: &str, err: &ApiError, expected: &str) {
    let matched = match expected {
        "NotFound" => matches!(err, ApiError::NotFound),
        "HttpError" => matches!(err, ApiError::HttpError { .. }),
        "DeserializationError" => matches!(err, ApiError::DeserializationError(_)),
        "InvalidInput" => matches!(err, ApiError::InvalidInput(_)),
        other => panic!("{name}: unknown expected_error: {other}"),
    };
    assert!(matched, "{name}: expected {expected}, got {err:?}");
}

/// Compare a parse result with the case's `expected_result` or `expected_error`.
fn check_outcome<T>(name: &str, case: &Value, result: Result<T, ApiError>)
where
    T: DeserializeOwned + PartialEq + std::fmt::Debug,
{
    if let Some(expected_error) = case.get("expected_error") {
        let err = result.unwrap_err();
        assert_error_kind(name, &err, expected_error.as_str().unwrap());
    } else {
        let expected: T = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(result.unwrap(), expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[test]
fn stats_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/stats.json")) {
        let name = case["name"].as_str().unwrap();
        let req = c.build_stats();
        check_request(name, &req, &case["expected_request"]);
        check_outcome::<NetworkStats>(name, &case, c.parse_stats(simulated(&case)));
    }
}

// ---------------------------------------------------------------------------
// Recent nodes
// ---------------------------------------------------------------------------

#[test]
fn recent_nodes_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/nodes.json")) {
        let name = case["name"].as_str().unwrap();
        let limit = case["input"]["limit"].as_u64().unwrap() as u32;
        let page = case["input"]["page"].as_u64().unwrap() as u32;

        let req = c.build_recent_nodes(limit, page);
        check_request(name, &req, &case["expected_request"]);
        check_outcome::<Vec<NodeRecord>>(name, &case, c.parse_recent_nodes(simulated(&case)));
    }
}

// ---------------------------------------------------------------------------
// Node details
// ---------------------------------------------------------------------------

#[test]
fn node_details_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/node.json")) {
        let name = case["name"].as_str().unwrap();
        let address = case["input_address"].as_str().unwrap();

        let req = c.build_node_details(address).unwrap();
        check_request(name, &req, &case["expected_request"]);
        check_outcome::<Option<NodeRecord>>(name, &case, c.parse_node_details(simulated(&case)));
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn search_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/search.json")) {
        let name = case["name"].as_str().unwrap();
        let query = case["input_query"].as_str().unwrap();

        let req = match c.build_search_nodes(query) {
            Ok(req) => req,
            Err(err) => {
                assert_error_kind(name, &err, case["expected_error"].as_str().unwrap());
                continue;
            }
        };
        check_request(name, &req, &case["expected_request"]);
        check_outcome::<Vec<NodeRecord>>(name, &case, c.parse_search_nodes(simulated(&case)));
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn history_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/history.json")) {
        let name = case["name"].as_str().unwrap();
        let range: TimeRange = case["input_range"].as_str().unwrap().parse().unwrap();

        let req = c.build_history(range);
        check_request(name, &req, &case["expected_request"]);
        check_outcome::<Vec<HistoricalSnapshot>>(name, &case, c.parse_history(simulated(&case)));
    }
}

// ---------------------------------------------------------------------------
// Incoming stats
// ---------------------------------------------------------------------------

#[test]
fn incoming_stats_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/incoming.json")) {
        let name = case["name"].as_str().unwrap();
        let req = c.build_incoming_stats();
        check_request(name, &req, &case["expected_request"]);
        check_outcome::<Vec<ProtocolStat>>(name, &case, c.parse_incoming_stats(simulated(&case)));
    }
}
