use serde_json::{Value, json};

use crate::util::{LoginResponse, connection_failure, print_failure, print_json, submit_login};

pub async fn run(base_url: &str, session_id: &str, phone: &str) -> i32 {
    match submit_login(base_url, session_id, phone).await {
        Ok(LoginResponse::Authenticated) => print_json(&json!({
            "session_id": session_id,
            "identity": phone,
            "authenticated": true
        })),
        Ok(LoginResponse::Rejected { status, body }) => rejected(status, &body),
        Err(e) => connection_failure(&e),
    }
}

/// Relay a structured login rejection (`ApiError` body) as a CLI failure.
pub fn rejected(status: u16, body: &Value) -> i32 {
    let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("login_failed");
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("login returned HTTP {status}"));
    let hint = body.get("docs_hint").and_then(Value::as_str);
    print_failure(error, &message, hint)
}
