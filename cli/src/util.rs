use finmock_mcp_runtime::SESSION_HEADER;
use serde_json::{Value, json};

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", to_pretty_json(&err));
    std::process::exit(1);
}

pub fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Print a successful payload on stdout and return exit code 0.
pub fn print_json(value: &Value) -> i32 {
    println!("{}", to_pretty_json(value));
    0
}

/// Print a failure payload on stderr and return exit code 1.
pub fn print_failure(error: &str, message: &str, docs_hint: Option<&str>) -> i32 {
    let mut err = json!({
        "error": error,
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", to_pretty_json(&err));
    1
}

pub fn connection_failure(err: &reqwest::Error) -> i32 {
    print_failure(
        "connection_error",
        &err.to_string(),
        Some("Is the finmock server running? Check FINMOCK_URL."),
    )
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

pub fn tool_call_envelope(id: u64, tool: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {
            "name": tool,
            "arguments": arguments
        }
    })
}

/// Parse `--arguments`. Only JSON objects are accepted.
pub fn parse_arguments(raw: Option<&str>) -> Result<Value, String> {
    let Some(raw) = raw else {
        return Ok(json!({}));
    };
    let value: Value =
        serde_json::from_str(raw).map_err(|e| format!("Invalid JSON in --arguments: {e}"))?;
    if !value.is_object() {
        return Err("--arguments must be a JSON object".to_string());
    }
    Ok(value)
}

/// Text of the first content item of a tools/call result. Parsed as JSON
/// when it is JSON, otherwise returned as a string value.
pub fn tool_result_text(response: &Value) -> Option<Value> {
    let text = response
        .get("result")?
        .get("content")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()?;
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

/// `login_url` of a login-required payload, if the response is one.
pub fn login_challenge(response: &Value) -> Option<String> {
    let payload = tool_result_text(response)?;
    if payload.get("status").and_then(Value::as_str) != Some("login_required") {
        return None;
    }
    payload
        .get("login_url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// POST a single JSON-RPC message to the stream endpoint.
pub async fn rpc_post(
    base_url: &str,
    session_id: Option<&str>,
    message: &Value,
) -> Result<Value, reqwest::Error> {
    let mut req = client()
        .post(endpoint(base_url, "/mcp/stream"))
        .json(message);
    if let Some(session_id) = session_id {
        req = req.header(SESSION_HEADER, session_id);
    }
    let resp = req.send().await?;
    let status = resp.status();
    match resp.json::<Value>().await {
        Ok(body) => Ok(body),
        Err(_) if status == reqwest::StatusCode::ACCEPTED => Ok(Value::Null),
        Err(e) => Err(e),
    }
}

pub enum LoginResponse {
    Authenticated,
    Rejected { status: u16, body: Value },
}

/// Submit the login form for `session_id`.
pub async fn submit_login(
    base_url: &str,
    session_id: &str,
    phone: &str,
) -> Result<LoginResponse, reqwest::Error> {
    let resp = client()
        .post(endpoint(base_url, "/login"))
        .form(&[("sessionId", session_id), ("phoneNumber", phone)])
        .send()
        .await?;

    let status = resp.status();
    if status.is_success() {
        return Ok(LoginResponse::Authenticated);
    }
    let body = resp
        .json::<Value>()
        .await
        .unwrap_or_else(|_| json!({"error": "non-json response"}));
    Ok(LoginResponse::Rejected {
        status: status.as_u16(),
        body,
    })
}
