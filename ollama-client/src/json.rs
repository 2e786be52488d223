//! Thin adapter over `serde_json`.
//!
//! Every place in the crate that builds, parses or dumps JSON goes through
//! these helpers so parse failures surface uniformly as
//! [`Error::InvalidJson`] with the offending payload attached.

use serde::Serialize;
pub use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A JSON object.
pub type Object = Map<String, Value>;

/// Create an empty JSON object value.
#[must_use]
pub fn object() -> Value {
    Value::Object(Object::new())
}

/// Parse a JSON document.
///
/// # Errors
///
/// Returns [`Error::InvalidJson`] when `text` is not valid JSON.
pub fn parse(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::invalid_json(e.to_string(), text))
}

/// Parse a JSON document that must be an object.
///
/// # Errors
///
/// Returns [`Error::InvalidJson`] when `text` is not a JSON object.
pub fn parse_object(text: &str) -> Result<Object> {
    serde_json::from_str(text).map_err(|e| Error::invalid_json(e.to_string(), text))
}

/// Serialise a value to compact JSON text.
///
/// # Errors
///
/// Returns [`Error::InvalidJson`] when the value cannot be represented as
/// JSON (e.g. a map with non-string keys).
pub fn dump<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::invalid_json(e.to_string(), String::new()))
}

/// Convert a serialisable value into a JSON value.
///
/// # Errors
///
/// Returns [`Error::InvalidJson`] when the value cannot be represented as JSON.
pub fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::invalid_json(e.to_string(), String::new()))
}

/// Read a string field, if present.
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Read a string entry of an object, if present.
pub(crate) fn str_field_of<'a>(map: &'a Object, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Extract the `error` text from a reply body, falling back to the raw body.
pub(crate) fn error_text(body: &str) -> String {
    parse(body)
        .ok()
        .and_then(|v| str_field(&v, "error").map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn object_is_empty_map() {
        assert_eq!(object(), serde_json::json!({}));
    }

    #[test]
    fn parse_reports_payload() {
        let err = parse("{\"a\":").unwrap_err();
        match err {
            Error::InvalidJson { payload, .. } => assert_eq!(payload, "{\"a\":"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_object_rejects_arrays() {
        assert!(parse_object("[1,2]").is_err());
        assert_eq!(parse_object(r#"{"k":1}"#).unwrap()["k"], 1);
    }

    #[test]
    fn dump_is_compact() {
        let value = serde_json::json!({"model": "m", "stream": false});
        assert_eq!(dump(&value).unwrap(), r#"{"model":"m","stream":false}"#);
    }

    #[test]
    fn error_text_prefers_error_field() {
        assert_eq!(error_text(r#"{"error":"model 'x' not found"}"#), "model 'x' not found");
        assert_eq!(error_text("  plain failure \n"), "plain failure");
        assert_eq!(error_text(r#"{"status":"nope"}"#), r#"{"status":"nope"}"#);
    }
}
