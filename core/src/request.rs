//! Caller configuration for `makeRequest` and body/content-type inference.
//!
//! # Design
//! `RequestConfig` is built from the loosely-typed configuration object the
//! host passes in. Unrecognized keys are ignored and ill-typed values fall
//! back to defaults instead of failing, so the only construction errors are
//! the ones the transport reports.

use serde_json::{Map, Value};

use crate::error::BridgeError;
use crate::http::{find_header, HttpRequest};

pub const DEFAULT_METHOD: &str = "GET";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A request body as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Sent verbatim.
    Text(String),
    /// An object or array, JSON-encoded before sending.
    Json(Value),
}

impl Body {
    /// Classify a host value. Anything other than a string, object or array
    /// is not a body.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Body::Text(s.clone())),
            Value::Object(_) | Value::Array(_) => Some(Body::Json(value.clone())),
            _ => None,
        }
    }

    fn into_payload(self) -> Result<String, BridgeError> {
        match self {
            Body::Text(s) => Ok(s),
            Body::Json(v) => {
                serde_json::to_string(&v).map_err(|e| BridgeError::CreateRequest(e.to_string()))
            }
        }
    }
}

/// Method, headers and body for a single request build.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestConfig {
    /// Read `method`, `headers` and `body` from a configuration value.
    ///
    /// `None`, `null` and non-object values yield the defaults.
    pub fn from_value(config: Option<&Value>) -> Self {
        let Some(Value::Object(config)) = config else {
            return Self::default();
        };

        let method = match config.get("method") {
            Some(Value::String(m)) => m.clone(),
            _ => DEFAULT_METHOD.to_string(),
        };

        let headers = match config.get("headers") {
            Some(Value::Object(map)) => header_pairs(map),
            _ => Vec::new(),
        };

        let body = config.get("body").and_then(Body::from_value);

        Self {
            method,
            headers,
            body,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolve the configuration against `url` into a sendable request.
    ///
    /// A non-empty payload is attached and, when no header named
    /// `Content-Type` exists in any casing, `Content-Type: application/json`
    /// is added. Empty payloads attach nothing.
    pub fn into_request(self, url: impl Into<String>) -> Result<HttpRequest, BridgeError> {
        let mut headers = self.headers;
        let payload = match self.body {
            Some(body) => body.into_payload()?,
            None => String::new(),
        };

        let body = if payload.is_empty() {
            None
        } else {
            if find_header(&headers, CONTENT_TYPE).is_none() {
                headers.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
            }
            Some(payload)
        };

        Ok(HttpRequest {
            method: self.method,
            url: url.into(),
            headers,
            body,
        })
    }
}

fn header_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), coerce_text(v)))
        .collect()
}

/// Text form of a host value: strings as-is, everything else JSON-encoded.
pub(crate) fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "http://localhost:3000/echo";

    #[test]
    fn missing_config_defaults_to_get_without_body() {
        let req = RequestConfig::from_value(None).into_request(URL).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, URL);
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn null_config_is_default() {
        assert_eq!(RequestConfig::from_value(Some(&Value::Null)), RequestConfig::default());
    }

    #[test]
    fn structured_body_infers_json() {
        let config = json!({ "method": "POST", "body": { "x": 1 } });
        let req = RequestConfig::from_value(Some(&config)).into_request(URL).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.body.as_deref(), Some(r#"{"x":1}"#));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn string_body_is_sent_verbatim() {
        let config = json!({ "method": "PUT", "body": "raw text" });
        let req = RequestConfig::from_value(Some(&config)).into_request(URL).unwrap();
        assert_eq!(req.body.as_deref(), Some("raw text"));
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn explicit_content_type_wins() {
        let config = json!({
            "method": "POST",
            "headers": { "Content-Type": "text/plain" },
            "body": "hello"
        });
        let req = RequestConfig::from_value(Some(&config)).into_request(URL).unwrap();
        assert_eq!(req.headers, vec![("Content-Type".to_string(), "text/plain".to_string())]);
    }

    #[test]
    fn lowercase_content_type_is_not_duplicated() {
        let config = json!({
            "method": "POST",
            "headers": { "content-type": "text/csv" },
            "body": "a,b"
        });
        let req = RequestConfig::from_value(Some(&config)).into_request(URL).unwrap();
        let content_types: Vec<_> = req
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(req.header("Content-Type"), Some("text/csv"));
    }

    #[test]
    fn empty_string_body_attaches_nothing() {
        let config = json!({ "method": "POST", "body": "" });
        let req = RequestConfig::from_value(Some(&config)).into_request(URL).unwrap();
        assert!(req.body.is_none());
        assert!(req.header("Content-Type").is_none());
    }

    #[test]
    fn unrecognized_body_types_are_ignored() {
        for body in [json!(42), json!(true), Value::Null] {
            let config = json!({ "method": "POST", "body": body });
            let req = RequestConfig::from_value(Some(&config)).into_request(URL).unwrap();
            assert!(req.body.is_none(), "{body}");
            assert!(req.headers.is_empty(), "{body}");
        }
    }

    #[test]
    fn array_body_is_encoded() {
        let config = json!({ "method": "POST", "body": [1, "two"] });
        let req = RequestConfig::from_value(Some(&config)).into_request(URL).unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"[1,"two"]"#));
    }

    #[test]
    fn header_values_are_coerced_to_text() {
        let config = json!({ "headers": { "X-Count": 3, "X-Name": "n", "X-Skip": null } });
        let cfg = RequestConfig::from_value(Some(&config));
        assert_eq!(
            cfg.headers,
            vec![
                ("X-Count".to_string(), "3".to_string()),
                ("X-Name".to_string(), "n".to_string()),
            ]
        );
    }

    #[test]
    fn non_string_method_falls_back_to_get() {
        let config = json!({ "method": 7 });
        assert_eq!(RequestConfig::from_value(Some(&config)).method, "GET");
    }

    #[test]
    fn builder_methods_compose() {
        let req = RequestConfig::default()
            .with_method("PATCH")
            .with_header("X-Trace", "1")
            .with_body(Body::Json(json!({ "k": "v" })))
            .into_request(URL)
            .unwrap();
        assert_eq!(req.method, "PATCH");
        assert_eq!(req.header("x-trace"), Some("1"));
        assert_eq!(req.body.as_deref(), Some(r#"{"k":"v"}"#));
    }
}
