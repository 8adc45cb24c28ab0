//! JSON output types for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Always JSON:** every response is valid JSON, except `render --format html`
//! 2. **Status first:** every response has `status` as its first field
//! 3. **Deterministic:** same input, same output (props are ordered maps)
//! 4. **Versioned:** `schema_version` enables forward compatibility

use std::io::{self, Write};

use jsonr_core::{Diagnostic, JsonrError, NodeKind, OutputErrorCode, ParentInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Success Responses
// ============================================================================

/// Response for `jsonr transform`.
#[derive(Debug, Clone, Serialize)]
pub struct TransformResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    /// The transformed tree.
    pub tree: Value,
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformResponse {
    pub fn new(tree: Value, diagnostics: Vec<Diagnostic>) -> Self {
        TransformResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            tree,
            diagnostics,
        }
    }
}

/// Response for `jsonr render --format json`.
#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    /// The rendered element tree.
    pub rendered: Value,
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderResponse {
    pub fn new(rendered: Value, diagnostics: Vec<Diagnostic>) -> Self {
        RenderResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            rendered,
            diagnostics,
        }
    }
}

/// One visited node in a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkEntry {
    pub depth: usize,
    pub index: usize,
    /// Summary of the containing structured node (null for the root).
    pub parent: Option<ParentInfo>,
    pub kind: NodeKind,
    /// The type name for structured nodes, the JSON text for primitives.
    pub label: String,
}

/// Response for `jsonr walk`.
#[derive(Debug, Clone, Serialize)]
pub struct WalkResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub order: String,
    pub entries: Vec<WalkEntry>,
}

impl WalkResponse {
    pub fn new(order: impl Into<String>, entries: Vec<WalkEntry>) -> Self {
        WalkResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            order: order.into(),
            entries,
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, also used as the exit code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorInfo {
    /// Create from a JsonrError.
    pub fn from_error(err: &JsonrError) -> Self {
        let details = match err {
            JsonrError::InvalidNode { path, .. } => Some(serde_json::json!({ "path": path })),
            JsonrError::FileNotFound { path } => Some(serde_json::json!({ "path": path })),
            JsonrError::UnknownType { type_name } => {
                Some(serde_json::json!({ "type": type_name }))
            }
            JsonrError::InvalidTraversalOrder { order } => Some(serde_json::json!({
                "order": order,
                "expected": ["depthFirstPre", "depthFirstPost", "breadthFirst"],
            })),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &JsonrError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for the CLI.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Emit a response as compact JSON (single line) to a writer.
pub fn emit_response_compact<T: Serialize>(
    response: &T,
    writer: &mut impl Write,
) -> io::Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render_json<T: Serialize>(response: &T) -> String {
        let mut buf = Vec::new();
        emit_response(response, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn status_is_first_field() {
        let response = TransformResponse::new(json!({"type": "div"}), vec![]);
        let text = render_json(&response);
        let status = text.find("\"status\"").unwrap();
        let version = text.find("\"schema_version\"").unwrap();
        let tree = text.find("\"tree\"").unwrap();
        assert!(status < version && version < tree);
    }

    #[test]
    fn error_response_carries_code_and_details() {
        let err = JsonrError::invalid_node("$.children[1]", "object is missing a type");
        let response = ErrorResponse::from_error(&err);
        let value: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], 2);
        assert_eq!(value["error"]["details"]["path"], "$.children[1]");
    }

    #[test]
    fn visitor_failures_have_no_details() {
        let response = ErrorResponse::from_error(&JsonrError::visitor("boom"));
        let value: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], 4);
        assert!(value["error"].get("details").is_none());
    }

    #[test]
    fn diagnostics_serialize_with_kind() {
        let response =
            RenderResponse::new(Value::Null, vec![Diagnostic::unresolved_handler("save")]);
        let value: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value["diagnostics"],
            json!([{
                "kind": "unresolved_handler",
                "subject": "save",
                "message": "Event handler not found: save"
            }])
        );
    }

    #[test]
    fn compact_output_is_single_line() {
        let mut buf = Vec::new();
        emit_response_compact(&WalkResponse::new("breadthFirst", vec![]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
