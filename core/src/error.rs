//! Error types for the crawler stats client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." The node-details endpoint never produces it: an absent node is an
//! `Ok(None)` there, not an error.

use thiserror::Error;

/// Errors returned by `StatsClient` and reported by hosts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The host could not complete the round-trip (connection refused,
    /// timeout, TLS failure...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// Rejected before a request was built.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// True for everything screens report as a failed load. `InvalidInput`
    /// is caught before a request leaves the screen.
    pub fn is_transport_class(&self) -> bool {
        !matches!(self, ApiError::InvalidInput(_))
    }
}
