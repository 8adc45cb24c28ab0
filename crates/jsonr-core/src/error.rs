//! Error types and error code constants for jsonr.
//!
//! Only configuration and data-decoding problems are errors here. Data-shape
//! problems met during rendering (unknown types, unresolved handlers,
//! unresolvable redirection targets) are reported as diagnostics instead; see
//! [`crate::diagnostics`].
//!
//! ## Error Code Mapping
//!
//! Exit codes used by the CLI and the JSON error envelope:
//! - `2`: Invalid arguments (bad options, malformed trees)
//! - `3`: Resolution errors (file not found, rejected type)
//! - `4`: Transform failed (a visitor returned an error)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad options, malformed tree).
    InvalidArguments = 2,
    /// Resolution errors (file not found, rejected node type).
    ResolutionError = 3,
    /// A visitor failed while transforming.
    TransformFailed = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the engine and the CLI.
#[derive(Debug, Error)]
pub enum JsonrError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Unrecognized traversal order name.
    #[error("invalid traversal order: {order}")]
    InvalidTraversalOrder { order: String },

    /// A JSON value could not be decoded as a node.
    #[error("invalid node at {path}: {reason}")]
    InvalidNode { path: String, reason: String },

    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A structured node type was rejected by a validation visitor.
    #[error("unknown component type '{type_name}'")]
    UnknownType { type_name: String },

    /// A visitor failed.
    #[error("visitor failed: {message}")]
    VisitorFailed { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

/// Result alias used across the engine.
pub type JsonrResult<T> = Result<T, JsonrError>;

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&JsonrError> for OutputErrorCode {
    fn from(err: &JsonrError) -> Self {
        match err {
            JsonrError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            JsonrError::InvalidTraversalOrder { .. } => OutputErrorCode::InvalidArguments,
            JsonrError::InvalidNode { .. } => OutputErrorCode::InvalidArguments,
            JsonrError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            JsonrError::UnknownType { .. } => OutputErrorCode::ResolutionError,
            JsonrError::VisitorFailed { .. } => OutputErrorCode::TransformFailed,
            JsonrError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<JsonrError> for OutputErrorCode {
    fn from(err: JsonrError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl JsonrError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        JsonrError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an invalid node error for the value at `path`.
    pub fn invalid_node(path: impl Into<String>, reason: impl Into<String>) -> Self {
        JsonrError::InvalidNode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        JsonrError::FileNotFound { path: path.into() }
    }

    /// Create a visitor failure.
    pub fn visitor(message: impl Into<String>) -> Self {
        JsonrError::VisitorFailed {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        JsonrError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn invalid_order_maps_to_invalid_arguments() {
            let err = JsonrError::InvalidTraversalOrder {
                order: "sideways".to_string(),
            };
            assert_eq!(
                OutputErrorCode::from(&err),
                OutputErrorCode::InvalidArguments
            );
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn invalid_node_maps_to_invalid_arguments() {
            let err = JsonrError::invalid_node("$.children[0]", "missing type");
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        }

        #[test]
        fn file_not_found_maps_to_resolution_error() {
            let err = JsonrError::file_not_found("tree.json");
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn unknown_type_maps_to_resolution_error() {
            let err = JsonrError::UnknownType {
                type_name: "marquee".to_string(),
            };
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
        }

        #[test]
        fn visitor_failure_maps_to_transform_failed() {
            let err = JsonrError::visitor("boom");
            assert_eq!(err.error_code(), OutputErrorCode::TransformFailed);
            assert_eq!(err.error_code().code(), 4);
        }

        #[test]
        fn internal_error_maps_to_internal_error() {
            let err = JsonrError::internal("unexpected state");
            assert_eq!(err.error_code(), OutputErrorCode::InternalError);
            assert_eq!(err.error_code().code(), 10);
        }
    }

    mod display {
        use super::*;

        #[test]
        fn messages_name_the_offending_value() {
            let err = JsonrError::InvalidTraversalOrder {
                order: "sideways".to_string(),
            };
            assert_eq!(err.to_string(), "invalid traversal order: sideways");

            let err = JsonrError::invalid_node("$.children", "type must be a string");
            assert_eq!(
                err.to_string(),
                "invalid node at $.children: type must be a string"
            );
        }
    }
}
