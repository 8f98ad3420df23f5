//! Top-level field projection over a JSON object.

use serde_json::{Map, Value};

use crate::error::BridgeError;

/// Parse `text` as a JSON object and keep only the requested top-level keys.
///
/// Keys that are not present are left out of the result rather than mapped
/// to `null`. Repeating a key has no further effect. A literal `null` input
/// reads as an empty object.
pub fn extract_fields<S: AsRef<str>>(text: &str, fields: &[S]) -> Result<String, BridgeError> {
    let source: Map<String, Value> = serde_json::from_str::<Option<Map<String, Value>>>(text)
        .map_err(|_| BridgeError::ExtractParse)?
        .unwrap_or_default();

    let mut projected = Map::new();
    for field in fields {
        let field = field.as_ref();
        if projected.contains_key(field) {
            continue;
        }
        if let Some(value) = source.get(field) {
            projected.insert(field.to_string(), value.clone());
        }
    }

    serde_json::to_string(&projected).map_err(|_| BridgeError::ExtractStringify)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted() {
        let out = extract_fields(r#"{"a":1,"b":2}"#, &["a", "c"]).unwrap();
        assert_eq!(out, r#"{"a":1}"#);
    }

    #[test]
    fn duplicates_collapse() {
        let out = extract_fields(r#"{"a":1,"b":2}"#, &["b", "b", "a"]).unwrap();
        assert_eq!(out, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn nested_values_are_copied_whole() {
        let out = extract_fields(r#"{"user":{"name":"x","tags":[1,2]},"z":0}"#, &["user"]).unwrap();
        assert_eq!(out, r#"{"user":{"name":"x","tags":[1,2]}}"#);
    }

    #[test]
    fn explicit_null_is_kept() {
        let out = extract_fields(r#"{"a":null}"#, &["a"]).unwrap();
        assert_eq!(out, r#"{"a":null}"#);
    }

    #[test]
    fn no_fields_gives_empty_object() {
        let out = extract_fields::<&str>(r#"{"a":1}"#, &[]).unwrap();
        assert_eq!(out, "{}");
    }

    #[test]
    fn null_input_projects_nothing() {
        let out = extract_fields(" null ", &["a"]).unwrap();
        assert_eq!(out, "{}");
    }

    #[test]
    fn non_object_input_is_rejected() {
        assert_eq!(
            extract_fields(r#"[1,2]"#, &["a"]).unwrap_err(),
            BridgeError::ExtractParse
        );
        assert_eq!(
            extract_fields("not json", &["a"]).unwrap_err(),
            BridgeError::ExtractParse
        );
    }
}
