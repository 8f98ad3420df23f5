//! JSON and HTTP bridge core for hosts that cannot parse JSON or block on I/O.
//!
//! # Overview
//! Three operations are exposed to the host:
//! - `processJSON(text)`: validate and canonically re-encode JSON.
//! - `extractFields(text, names)`: keep selected top-level keys of an object.
//! - `makeRequest(url, config?)`: run an HTTP request in the background and
//!   settle a single-resolution [`Promise`] with a [`ResponseEnvelope`] or an
//!   [`ErrorOutcome`].
//! - `get(url, config?)`: `makeRequest` with the method forced to `GET`.
//!
//! # Design
//! - Every failure is converted to `{"error": "..."}` where it happens; the
//!   JSON operations return it, the request path rejects with it.
//! - Request shaping (`request`), execution (`transport`) and response
//!   shaping (`envelope`) are separate steps over plain data, so only the
//!   transport touches the network.
//! - `Bridge` owns a tokio runtime; requests run under `spawn_blocking` and
//!   the caller never waits on them.

pub mod bridge;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod http;
pub mod normalize;
pub mod promise;
pub mod request;
pub mod transport;

pub use bridge::{extract_fields, process_json, Bridge, BridgeOptions};
pub use envelope::{HeaderValue, ResponseEnvelope};
pub use error::{BridgeError, ErrorOutcome};
pub use http::{canonical_header_name, HttpRequest, HttpResponse};
pub use promise::{Promise, Resolver, Settlement};
pub use request::{Body, RequestConfig};
pub use transport::{Transport, UreqTransport};
