//! Fixture HTTP server for exercising the request bridge end-to-end.
//!
//! Each route pins down one response shape the bridge must handle: JSON and
//! plain-text bodies, bodies of a requested size, repeated headers,
//! arbitrary status codes, and an echo of whatever the client sent.

use std::collections::BTreeMap;

use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/json", get(json_body))
        .route("/text", get(text_body))
        .route("/null", get(null_body))
        .route("/multi-header", get(multi_header))
        .route("/status/{code}", get(status))
        .route("/bytes/{len}", get(sized_body))
        .route("/echo", any(echo))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn json_body() -> Json<Value> {
    Json(json!({ "message": "hello", "items": [1, 2, 3] }))
}

async fn text_body() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "plain text, not json")
}

async fn null_body() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "null")
}

async fn multi_header() -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, "a=1"), (header::SET_COOKIE, "b=2")]),
        [("x-single", "one")],
        "ok",
    )
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// `len` bytes of `a`, served as plain text.
async fn sized_body(Path(len): Path<usize>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "a".repeat(len))
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        seen.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    tracing::debug!(%method, bytes = body.len(), "echo");
    Json(Echo {
        method: method.to_string(),
        headers: seen,
        body,
    })
}
