use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use finmock_mcp_runtime::SESSION_HEADER;
use finmock_mcp_runtime::rpc::{RpcError, error_response};
use serde_json::Value;

use crate::state::AppState;

const MCP_PATH: &str = "/mcp/stream";

pub fn router() -> Router<AppState> {
    Router::new().route(MCP_PATH, post(mcp_post).get(mcp_get))
}

async fn mcp_get() -> Response {
    StatusCode::METHOD_NOT_ALLOWED.into_response()
}

/// JSON-RPC tool endpoint. The session id travels in the `Mcp-Session-Id`
/// header and is echoed back on the response.
#[utoipa::path(
    post,
    path = "/mcp/stream",
    request_body(content = serde_json::Value, content_type = "application/json"),
    params(
        ("Mcp-Session-Id" = Option<String>, Header, description = "Caller-chosen session id, required for tools/call")
    ),
    responses(
        (status = 200, description = "JSON-RPC response (single object or batch array)"),
        (status = 202, description = "Notification accepted, no body"),
        (status = 415, description = "Content-Type is not application/json")
    ),
    tag = "mcp"
)]
pub async fn mcp_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_json_content_type(&headers) {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(error_response(
                Value::Null,
                RpcError::invalid_request("Content-Type must be application/json"),
            )),
        )
            .into_response();
    }

    let session_id = header_value(&headers, SESSION_HEADER);
    let mut responses = state.endpoint.handle_body(session_id.as_deref(), &body).await;

    let mut response = match responses.len() {
        0 => StatusCode::ACCEPTED.into_response(),
        1 => (StatusCode::OK, Json(responses.remove(0))).into_response(),
        _ => (StatusCode::OK, Json(Value::Array(responses))).into_response(),
    };

    if let Some(value) = session_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    header_value(headers, CONTENT_TYPE.as_str())
        .and_then(|v| v.split(';').next().map(|mime| mime.trim().to_ascii_lowercase()))
        .is_some_and(|mime| mime == "application/json")
}

fn header_value(headers: &HeaderMap, key: &str) -> Option<String> {
    headers
        .get(key)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}
