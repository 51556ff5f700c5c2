//! Shared HTTP utilities for the message catalog workspace.
//!
//! Provides the structured error bodies and the mapping from core errors to
//! HTTP status codes used by the api-server.

use catalog::{CoreError, FieldError};

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "invalid_request" => "Request failed validation",
        "conflict" => "Resource already exists",
        "error" | "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a validation error JSON listing every rejected field.
///
/// Returns: `{"error": {"code": "invalid_request", "message": "...", "fields": [{"field", "code"}]}}`
pub fn json_validation_error(fields: &[FieldError]) -> serde_json::Value {
    let message = fields
        .iter()
        .map(|f| f.code)
        .collect::<Vec<_>>()
        .join(", ");
    serde_json::json!({
        "error": {
            "code": "invalid_request",
            "message": message,
            "fields": fields,
        }
    })
}

// ============================================================================
// Core error mapping
// ============================================================================

/// HTTP status and body for a core error.
///
/// Repository failures get a generic body; callers log the detail.
pub fn core_error_response(err: &CoreError) -> (u16, serde_json::Value) {
    match err {
        CoreError::Validation(fields) => (400, json_validation_error(fields)),
        CoreError::InvalidLanguageTag(tag) => (
            400,
            json_error_with_message("invalid_request", &format!("invalid language tag: {tag}")),
        ),
        CoreError::NotFound => (404, json_err("not_found")),
        CoreError::AlreadyExists => (409, json_err("conflict")),
        CoreError::Conflict(msg) => (409, json_error_with_message("conflict", msg)),
        CoreError::Repository(_) => (500, json_err("internal")),
    }
}
