use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use finmock_core::error::{self, ApiError};
use finmock_core::{LoginError, SessionError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// No fixture data provisioned for the submitted identity (404)
    UnknownIdentity { identity: String },
    /// Session already bound to a different identity (409)
    SessionAlreadyBound { session_id: String },
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::UnknownIdentity { identity } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::UNKNOWN_IDENTITY.to_string(),
                    message: format!("No test data is provisioned for phone number '{identity}'"),
                    field: Some("phoneNumber".to_string()),
                    received: Some(serde_json::Value::String(identity)),
                    request_id,
                    docs_hint: Some(
                        "Use one of the phone numbers listed on the login page.".to_string(),
                    ),
                },
            ),
            AppError::SessionAlreadyBound { session_id } => (
                StatusCode::CONFLICT,
                ApiError {
                    error: error::codes::SESSION_ALREADY_BOUND.to_string(),
                    message: format!(
                        "Session '{session_id}' is already logged in with a different phone number"
                    ),
                    field: Some("sessionId".to_string()),
                    received: Some(serde_json::Value::String(session_id)),
                    request_id,
                    docs_hint: Some(
                        "Start a new session id to log in as another identity.".to_string(),
                    ),
                },
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::EmptySessionId => AppError::Validation {
                message: "sessionId must not be empty".to_string(),
                field: Some("sessionId".to_string()),
                received: None,
                docs_hint: Some("Open the login_url returned by tools/call.".to_string()),
            },
            LoginError::UnknownIdentity(identity) => AppError::UnknownIdentity {
                identity: identity.to_string(),
            },
            LoginError::SessionAlreadyBound(SessionError::SessionAlreadyBound {
                session_id, ..
            }) => AppError::SessionAlreadyBound { session_id },
            LoginError::Storage(err) => AppError::Internal(err.to_string()),
        }
    }
}
