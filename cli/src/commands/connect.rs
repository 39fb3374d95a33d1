use finmock_core::Tool;
use serde_json::{Value, json};
use uuid::Uuid;

use super::login::rejected;
use super::tools::print_rpc_response;
use crate::util::{
    LoginResponse, connection_failure, login_challenge, print_failure, rpc_post, submit_login,
    tool_call_envelope, tool_result_text,
};

/// Full flow on a fresh session: call, follow the login challenge, call again.
pub async fn run(base_url: &str, phone: &str, tool: Tool) -> i32 {
    let session_id = Uuid::new_v4().to_string();

    let first = tool_call_envelope(1, tool.as_str(), json!({}));
    let response = match rpc_post(base_url, Some(&session_id), &first).await {
        Ok(response) => response,
        Err(e) => return connection_failure(&e),
    };
    let Some(login_url) = login_challenge(&response) else {
        return print_failure(
            "unexpected_response",
            &format!("expected a login challenge for a new session, got {response}"),
            None,
        );
    };

    match submit_login(base_url, &session_id, phone).await {
        Ok(LoginResponse::Authenticated) => {}
        Ok(LoginResponse::Rejected { status, body }) => return rejected(status, &body),
        Err(e) => return connection_failure(&e),
    }

    let second = tool_call_envelope(2, tool.as_str(), json!({}));
    let response = match rpc_post(base_url, Some(&session_id), &second).await {
        Ok(response) => response,
        Err(e) => return connection_failure(&e),
    };
    print_rpc_response(&response, |_| {
        json!({
            "session_id": session_id,
            "login_url": login_url,
            "tool": tool.as_str(),
            "document": tool_result_text(&response).unwrap_or(Value::Null),
        })
    })
}
