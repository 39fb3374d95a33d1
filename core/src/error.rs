use serde::Serialize;
use utoipa::ToSchema;

/// Structured error body for the plain HTTP routes (login, login page).
/// JSON-RPC failures on the protocol endpoint use JSON-RPC error objects instead.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "unknown_identity")
    pub error: String,
    /// Human/agent-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the HTTP surface and in JSON-RPC `error.data`.
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const UNKNOWN_IDENTITY: &str = "unknown_identity";
    pub const SESSION_ALREADY_BOUND: &str = "session_already_bound";
    pub const UNKNOWN_TOOL: &str = "unknown_tool";
    pub const FIXTURE_NOT_FOUND: &str = "fixture_not_found";
    pub const STORAGE_ERROR: &str = "storage_error";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
