//! JSON normalization: parse a text payload and re-encode it compactly.

use serde_json::Value;

use crate::error::BridgeError;

/// Validate `text` as JSON and return its canonical compact encoding.
///
/// Whitespace is dropped and object keys come back sorted; the value itself
/// is structurally unchanged.
pub fn normalize(text: &str) -> Result<String, BridgeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| BridgeError::ParseJson(e.to_string()))?;
    serde_json::to_string(&value).map_err(|e| BridgeError::StringifyJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace() {
        let out = normalize("{ \"b\" : [1, 2,\n 3], \"a\": null }").unwrap();
        assert_eq!(out, r#"{"a":null,"b":[1,2,3]}"#);
    }

    #[test]
    fn scalars_round_trip() {
        assert_eq!(normalize("0").unwrap(), "0");
        assert_eq!(normalize(" \"hi\" ").unwrap(), "\"hi\"");
        assert_eq!(normalize("true").unwrap(), "true");
        assert_eq!(normalize("null").unwrap(), "null");
    }

    #[test]
    fn empty_input_is_parse_error() {
        let err = normalize("").unwrap_err();
        assert!(matches!(err, BridgeError::ParseJson(_)));
        assert!(err.to_string().starts_with("Failed parse JSON: "));
    }

    #[test]
    fn malformed_input_surfaces_parser_message() {
        let err = normalize("{\"a\":").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed parse JSON: "), "{msg}");
        assert!(msg.contains("EOF"), "{msg}");
    }

    #[test]
    fn nested_structure_is_preserved() {
        let input = r#"{"outer":{"inner":[{"x":1.5},{"y":"z"}]}}"#;
        let out = normalize(input).unwrap();
        let a: Value = serde_json::from_str(input).unwrap();
        let b: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(a, b);
    }
}
