//! Request execution.
//!
//! # Design
//! `Transport` is the seam between request shaping and the network. The
//! bridge only ever calls it from a blocking worker thread, so
//! implementations are free to block. Errors come back already classified
//! as construction, execution or body-read failures.

use ureq::http::Request;

use crate::error::BridgeError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes a plain-data request and returns a plain-data response.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, BridgeError>;
}

/// Blocking transport backed by a shared `ureq` agent.
///
/// Non-2xx statuses are returned as responses, not errors. Any method token
/// is sent as given, and response bodies are read in full with no size cap.
/// Timeouts, redirects and TLS use the agent defaults.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, BridgeError> {
        let mut builder = Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let create = |e: ureq::http::Error| BridgeError::CreateRequest(e.to_string());
        let result = match &request.body {
            Some(body) => self.agent.run(builder.body(body.clone()).map_err(create)?),
            None => self.agent.run(builder.body(()).map_err(create)?),
        };
        let mut response = result.map_err(|e| BridgeError::ExecuteRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| BridgeError::ReadBody(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}
