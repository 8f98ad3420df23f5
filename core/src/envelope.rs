//! The normalized response handed back to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;
use crate::http::{canonical_header_name, HttpResponse};

/// A response header: a bare string when received once, a list otherwise.
///
/// Consumers branch on the shape, so a single value is never wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            HeaderValue::Single(values.remove(0))
        } else {
            HeaderValue::Multiple(values)
        }
    }
}

/// Status, headers and decoded body of a completed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub data: Value,
    pub status: u16,
    pub headers: BTreeMap<String, HeaderValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Group headers by canonical name and decode the body.
    ///
    /// Names are canonicalized (`content-type` becomes `Content-Type`), so
    /// values received under different casings share one entry.
    ///
    /// A body that parses as JSON becomes `data` as-is, including bare
    /// scalars like `null` or `0`. Anything else is kept as raw text.
    pub fn from_response(response: HttpResponse) -> Self {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in response.headers {
            grouped
                .entry(canonical_header_name(&name))
                .or_default()
                .push(value);
        }
        let headers = grouped
            .into_iter()
            .map(|(name, values)| (name, HeaderValue::from_values(values)))
            .collect();

        let data = match serde_json::from_str::<Value>(&response.body) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(response.body),
        };

        Self {
            data,
            status: response.status,
            headers,
            error: None,
        }
    }

    /// The envelope as a structured value ready to hand to the host.
    pub fn to_value(&self) -> Result<Value, BridgeError> {
        serde_json::to_value(self).map_err(|e| BridgeError::MarshalResponse(e.to_string()))
    }
}
