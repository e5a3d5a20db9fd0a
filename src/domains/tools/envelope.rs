//! Uniform result envelope shared by every tool.
//!
//! Each tool serializes its outcome as a single pretty-printed JSON payload
//! inside one text content unit: `{"success": true, ...fields}` on success,
//! `{"success": false, "error": "..."}` on failure. The caller inspects the
//! `success` discriminant; there is no visible distinction between bad input
//! and a system fault.

use rmcp::model::{CallToolResult, Content};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::warn;

use super::error::ToolError;

/// Build a success envelope from an object payload.
///
/// The `success` discriminant is injected first, followed by the payload's
/// own fields. Non-object payloads are nested under a `result` key so the
/// envelope stays a flat mapping.
pub fn success_envelope(payload: Value) -> CallToolResult {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    match payload {
        Value::Object(fields) => body.extend(fields),
        other => {
            body.insert("result".to_string(), other);
        }
    }
    CallToolResult::success(vec![Content::text(pretty(&Value::Object(body)))])
}

/// Build a failure envelope from any displayable error.
///
/// The result is marked as an error at the MCP level and carries the
/// `{"success": false, "error"}` body for envelope-parsing callers.
pub fn failure_envelope(error: impl std::fmt::Display) -> CallToolResult {
    let message = error.to_string();
    warn!("{}", message);
    let body = json!({
        "success": false,
        "error": message,
    });
    CallToolResult::error(vec![Content::text(pretty(&body))])
}

/// Normalize an operation outcome into the envelope.
pub fn envelope(result: Result<Value, ToolError>) -> CallToolResult {
    match result {
        Ok(payload) => success_envelope(payload),
        Err(e) => failure_envelope(e),
    }
}

/// Deserialize tool arguments into a parameter struct.
///
/// Missing required fields and wrong types surface as an invalid-arguments
/// failure rather than a transport-level error, keeping validation inside
/// the envelope contract.
pub fn parse_params<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Extract the envelope body from a tool result (test helper used across
/// the tool modules).
#[cfg(test)]
pub fn envelope_body(result: &CallToolResult) -> Value {
    let text = match &result.content[0].raw {
        rmcp::model::RawContent::Text(text) => &text.text,
        _ => panic!("Expected text content"),
    };
    serde_json::from_str(text).expect("envelope must be valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_merges_fields() {
        let result = success_envelope(json!({"rows": 3, "columns": ["a", "b"]}));
        assert!(result.is_error.is_none() || !result.is_error.unwrap());

        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["rows"], json!(3));
        assert_eq!(body["columns"], json!(["a", "b"]));
    }

    #[test]
    fn test_failure_envelope_contains_message() {
        let result = failure_envelope(ToolError::UnknownTool("data_bogus".to_string()));
        assert!(result.is_error.unwrap_or(false));

        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Unknown tool: data_bogus"));
    }

    #[test]
    fn test_parse_params_missing_field() {
        #[derive(Debug, serde::Deserialize)]
        struct Params {
            #[allow(dead_code)]
            path: String,
        }

        let err = parse_params::<Params>(json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_scalar_payload_wrapped() {
        let result = success_envelope(json!(42));
        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["result"], json!(42));
    }
}
