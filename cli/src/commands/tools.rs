use serde_json::{Value, json};

use crate::util::{
    connection_failure, parse_arguments, print_failure, print_json, rpc_post, tool_call_envelope,
    tool_result_text,
};

/// `tools/list`
pub async fn list(base_url: &str) -> i32 {
    let message = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
    match rpc_post(base_url, None, &message).await {
        Ok(response) => print_rpc_response(&response, |result| result.clone()),
        Err(e) => connection_failure(&e),
    }
}

/// `tools/call` on an existing session. A login-required payload is printed
/// like any other result; it is not an error from the client's point of view.
pub async fn call(base_url: &str, session_id: &str, tool: &str, arguments: Option<&str>) -> i32 {
    let arguments = match parse_arguments(arguments) {
        Ok(arguments) => arguments,
        Err(message) => return print_failure("cli_error", &message, None),
    };
    let message = tool_call_envelope(1, tool, arguments);
    match rpc_post(base_url, Some(session_id), &message).await {
        Ok(response) => print_rpc_response(&response, |_| {
            tool_result_text(&response).unwrap_or(Value::Null)
        }),
        Err(e) => connection_failure(&e),
    }
}

/// Print `result` (projected through `render`) or turn a JSON-RPC error
/// object into a CLI failure.
pub fn print_rpc_response(response: &Value, render: impl FnOnce(&Value) -> Value) -> i32 {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let kind = error
            .get("data")
            .and_then(|d| d.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("rpc_error");
        let hint = error
            .get("data")
            .and_then(|d| d.get("docs_hint"))
            .and_then(Value::as_str);
        return print_failure(kind, &format!("{message} (code {code})"), hint);
    }
    match response.get("result") {
        Some(result) => print_json(&render(result)),
        None => print_failure("invalid_response", &response.to_string(), None),
    }
}
