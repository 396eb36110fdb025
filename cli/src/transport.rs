//! Blocking HTTP execution of core requests with ureq.

use std::time::Duration;

use crawlstats_core::{ApiError, Exchange, HttpMethod, HttpRequest, HttpResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct Transport {
    agent: ureq::Agent,
}

impl Transport {
    /// Status codes are returned as data so the core decides what a 404 or
    /// a 500 means.
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn execute(&self, req: HttpRequest) -> Exchange {
        tracing::debug!(method = req.method.as_str(), url = %req.url, "sending request");
        let mut builder = match req.method {
            HttpMethod::Get => self.agent.get(&req.url),
        };
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        let mut response = builder.call().map_err(|e| {
            tracing::warn!(url = %req.url, error = %e, "request failed");
            ApiError::Transport(e.to_string())
        })?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        tracing::debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse::new(status, body))
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
