//! Error types for the bridge operations.
//!
//! # Design
//! Every variant's `Display` text is exactly the message the caller sees in
//! the `error` field of an [`ErrorOutcome`]. Variants carrying a detail
//! string embed the underlying parser, transport, or encoder message inline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the three bridge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// `processJSON` was called without arguments.
    #[error("Missing JSON input")]
    MissingJsonInput,

    /// `processJSON` input is not valid JSON.
    #[error("Failed parse JSON: {0}")]
    ParseJson(String),

    /// `processJSON` could not re-encode the parsed value.
    #[error("Failed stringify JSON: {0}")]
    StringifyJson(String),

    /// `extractFields` was called with fewer than two arguments.
    #[error("Missing args")]
    MissingArgs,

    /// `extractFields` input is not a JSON object.
    #[error("Failed to parse JSON")]
    ExtractParse,

    /// `extractFields` could not encode the projected object.
    #[error("Failed to stringify JSON")]
    ExtractStringify,

    /// `makeRequest` was called without a URL.
    #[error("URL not set")]
    UrlNotSet,

    /// The method/URL/header combination could not form a request.
    #[error("Failed to create request: {0}")]
    CreateRequest(String),

    /// The transport failed before a response arrived.
    #[error("Failed to execute request: {0}")]
    ExecuteRequest(String),

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    ReadBody(String),

    /// The response envelope could not be serialized.
    #[error("Failed to marshal response: {0}")]
    MarshalResponse(String),

    /// The worker runtime could not be started.
    #[error("Failed to start runtime: {0}")]
    Runtime(String),
}

/// The single failure shape handed back to the caller: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorOutcome {
    pub error: String,
}

impl ErrorOutcome {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// The outcome as a JSON object value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.error })
    }
}

impl From<BridgeError> for ErrorOutcome {
    fn from(err: BridgeError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<&BridgeError> for ErrorOutcome {
    fn from(err: &BridgeError) -> Self {
        Self::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_embed_detail() {
        let err = BridgeError::ExecuteRequest("connection refused".to_string());
        assert_eq!(err.to_string(), "Failed to execute request: connection refused");
    }

    #[test]
    fn outcome_serializes_as_single_field() {
        let outcome = ErrorOutcome::from(BridgeError::MissingArgs);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Missing args" }));
        assert_eq!(outcome.to_value(), json);
    }
}
