//! JSON-RPC tool-call endpoint. Every `tools/call` is gated on the caller's
//! session: unauthenticated sessions get an in-band login challenge,
//! authenticated ones get the fixture document for their bound identity.

use finmock_core::{Fixture, SessionStore, Tool, ToolDispatcher};
use serde_json::{Map, Value, json};
use thiserror::Error;
use url::Url;

pub mod rpc;

use rpc::{RpcError, error_response, success_response, text_content};

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const MCP_SERVER_NAME: &str = "finmock";
/// Request header carrying the caller-chosen session id.
pub const SESSION_HEADER: &str = "mcp-session-id";
pub const LOGIN_PAGE_PATH: &str = "mockWebPage";
const LOGIN_REQUIRED_MESSAGE: &str = "This session is not logged in. Open login_url in a browser, \
     submit a provisioned phone number, then retry the same tool call with the same session id.";

/// A decoded `tools/call` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub protocol_version: String,
    pub request_id: Value,
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    fn from_params(
        protocol_version: &str,
        request_id: Value,
        params: &Value,
    ) -> Result<Self, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_request("tools/call params must be an object"))?;

        let tool_name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_request("tools/call requires string field 'name'"))?;

        let arguments = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        Ok(Self {
            protocol_version: protocol_version.to_string(),
            request_id,
            tool_name: tool_name.to_string(),
            arguments,
        })
    }
}

/// Payload of a successful `tools/call`.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallResult {
    LoginRequired { login_url: String, message: String },
    Document(Fixture),
}

impl ToolCallResult {
    pub fn into_result_value(self) -> Value {
        match self {
            ToolCallResult::LoginRequired { login_url, message } => text_content(
                json!({
                    "status": "login_required",
                    "login_url": login_url,
                    "message": message,
                })
                .to_string(),
            ),
            ToolCallResult::Document(fixture) => text_content(fixture.into_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum BaseUrlError {
    #[error("invalid base URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("base URL '{0}' cannot carry a path")]
    NotHierarchical(String),
}

/// Parses the server's public base address used to build login URLs.
pub fn parse_base_url(raw: &str) -> Result<Url, BaseUrlError> {
    let url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() {
        return Err(BaseUrlError::NotHierarchical(raw.to_string()));
    }
    Ok(url)
}

/// Login page URL for `session_id`. Depends only on the base address and
/// the session id.
pub fn login_url(base_url: &Url, session_id: &str) -> String {
    let mut url = base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(LOGIN_PAGE_PATH);
    }
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("sessionId", session_id);
    url.into()
}

#[derive(Clone)]
pub struct McpEndpoint {
    sessions: SessionStore,
    dispatcher: ToolDispatcher,
    base_url: Url,
}

impl McpEndpoint {
    pub fn new(sessions: SessionStore, dispatcher: ToolDispatcher, base_url: Url) -> Self {
        Self {
            sessions,
            dispatcher,
            base_url,
        }
    }

    /// Handles a raw request body. Returns one response per request in the
    /// body; notifications produce none.
    pub async fn handle_body(&self, session_id: Option<&str>, body: &[u8]) -> Vec<Value> {
        match serde_json::from_slice::<Value>(body) {
            Ok(incoming) => self.handle_incoming_message(session_id, incoming).await,
            Err(err) => {
                tracing::debug!(error = %err, "rejected unparsable JSON-RPC body");
                vec![error_response(Value::Null, RpcError::parse_error())]
            }
        }
    }

    pub async fn handle_incoming_message(
        &self,
        session_id: Option<&str>,
        incoming: Value,
    ) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Some(batch) = incoming.as_array() {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(session_id, item).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(session_id, &incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(
        &self,
        session_id: Option<&str>,
        incoming: &Value,
    ) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };
        let id = obj.get("id").cloned();

        let Some(protocol_version) = obj
            .get("jsonrpc")
            .and_then(Value::as_str)
            .filter(|version| *version == "2.0")
        else {
            return Some(error_response(
                id.unwrap_or(Value::Null),
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        };

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            return Some(error_response(
                id.unwrap_or(Value::Null),
                RpcError::invalid_request("Request requires string field 'method'"),
            ));
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        let Some(id) = id else {
            tracing::debug!(method, "notification ignored");
            return None;
        };

        let outcome = self
            .handle_request(session_id, protocol_version, id.clone(), method, &params)
            .await;
        Some(match outcome {
            Ok(payload) => success_response(id, payload),
            Err(err) => error_response(id, err),
        })
    }

    async fn handle_request(
        &self,
        session_id: Option<&str>,
        protocol_version: &str,
        id: Value,
        method: &str,
        params: &Value,
    ) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(tools_list_payload()),
            "tools/call" => {
                let request = ToolCallRequest::from_params(protocol_version, id, params)?;
                let session_id = session_id
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        RpcError::invalid_request("tools/call requires the Mcp-Session-Id header")
                    })?;
                self.call_tool(session_id, request)
                    .await
                    .map(ToolCallResult::into_result_value)
            }
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    /// Runs one tool call for `session_id`. The login challenge takes
    /// precedence over tool-name validation.
    pub async fn call_tool(
        &self,
        session_id: &str,
        request: ToolCallRequest,
    ) -> Result<ToolCallResult, RpcError> {
        let session = self.sessions.get_or_create(session_id);
        let Some(identity) = session.bound_identity() else {
            tracing::info!(
                session_id,
                request_id = %request.request_id,
                tool = %request.tool_name,
                "login required"
            );
            return Ok(ToolCallResult::LoginRequired {
                login_url: login_url(&self.base_url, session_id),
                message: LOGIN_REQUIRED_MESSAGE.to_string(),
            });
        };

        match self
            .dispatcher
            .invoke(identity, &request.tool_name, &request.arguments)
            .await
        {
            Ok(fixture) => Ok(ToolCallResult::Document(fixture)),
            Err(err) => {
                tracing::info!(
                    session_id,
                    request_id = %request.request_id,
                    protocol_version = %request.protocol_version,
                    identity = %identity,
                    tool = %request.tool_name,
                    error = %err,
                    "tool call failed"
                );
                Err(err.into())
            }
        }
    }
}

fn initialize_payload() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": MCP_SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": "Send every request with an Mcp-Session-Id header. The first tools/call on a new session returns status=login_required with a login_url; complete the login there, then repeat the call."
    })
}

fn tools_list_payload() -> Value {
    let tools: Vec<Value> = Tool::ALL
        .into_iter()
        .map(|tool| {
            json!({
                "name": tool.as_str(),
                "description": tool.description(),
                "inputSchema": {
                    "type": "object",
                    "properties": {}
                }
            })
        })
        .collect();
    json!({ "tools": tools })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use finmock_core::{AuthGateway, Identity, InMemoryFixtures};

    const NET_WORTH: &str = "{\n  \"netWorthResponse\": {\"totalNetWorthValue\": {\"currencyCode\": \"INR\", \"units\": \"868721\"}}\n}";

    struct Harness {
        endpoint: McpEndpoint,
        gateway: AuthGateway,
        sessions: SessionStore,
    }

    fn harness() -> Harness {
        let fixtures: Arc<InMemoryFixtures> = Arc::new(
            InMemoryFixtures::new()
                .with_document("1010101010", Tool::FetchNetWorth, NET_WORTH)
                .with_document("1010101010", Tool::FetchCreditReport, "{\"creditReports\": []}")
                .with_identity("2020202020"),
        );
        let sessions = SessionStore::new();
        let base_url = parse_base_url("http://localhost:8080").expect("base url");
        Harness {
            endpoint: McpEndpoint::new(
                sessions.clone(),
                ToolDispatcher::new(fixtures.clone()),
                base_url,
            ),
            gateway: AuthGateway::new(sessions.clone(), fixtures),
            sessions,
        }
    }

    fn tool_call(id: i64, name: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": {} }
        })
    }

    async fn single(endpoint: &McpEndpoint, session_id: Option<&str>, message: Value) -> Value {
        let mut responses = endpoint.handle_incoming_message(session_id, message).await;
        assert_eq!(responses.len(), 1, "expected exactly one response");
        responses.remove(0)
    }

    fn text_payload(response: &Value) -> &str {
        response["result"]["content"][0]["text"]
            .as_str()
            .expect("text content")
    }

    #[test]
    fn login_url_embeds_the_session_id() {
        let base = parse_base_url("http://localhost:8080").expect("base");
        assert_eq!(
            login_url(&base, "s1"),
            "http://localhost:8080/mockWebPage?sessionId=s1"
        );
    }

    #[test]
    fn login_url_keeps_base_path_and_encodes_the_id() {
        let base = parse_base_url("https://mock.example.com/fi/").expect("base");
        assert_eq!(
            login_url(&base, "a b&c"),
            "https://mock.example.com/fi/mockWebPage?sessionId=a+b%26c"
        );
    }

    #[test]
    fn base_url_must_be_hierarchical() {
        assert!(parse_base_url("mailto:someone@example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[tokio::test]
    async fn first_call_on_fresh_session_requires_login() {
        let h = harness();
        let response = single(&h.endpoint, Some("s1"), tool_call(1, "fetch_net_worth")).await;

        assert_eq!(response["id"], json!(1));
        assert!(response.get("error").is_none());
        let payload: Value = serde_json::from_str(text_payload(&response)).expect("json text");
        assert_eq!(payload["status"], json!("login_required"));
        let url = payload["login_url"].as_str().expect("login_url");
        assert!(url.contains("sessionId=s1"));
        assert_eq!(h.sessions.is_authenticated("s1"), (false, None));
    }

    #[tokio::test]
    async fn login_challenge_wins_over_unknown_tool_names() {
        let h = harness();
        let response = single(&h.endpoint, Some("s1"), tool_call(2, "fetch_crypto")).await;

        let payload: Value = serde_json::from_str(text_payload(&response)).expect("json text");
        assert_eq!(payload["status"], json!("login_required"));
    }

    #[tokio::test]
    async fn authenticated_call_returns_fixture_verbatim() {
        let h = harness();
        single(&h.endpoint, Some("s1"), tool_call(1, "fetch_net_worth")).await;
        h.gateway
            .login("s1", &Identity::new("1010101010"))
            .await
            .expect("login");

        let response = single(&h.endpoint, Some("s1"), tool_call(3, "fetch_net_worth")).await;

        assert_eq!(response["id"], json!(3));
        assert_eq!(text_payload(&response), NET_WORTH);
    }

    #[tokio::test]
    async fn failed_login_keeps_the_challenge() {
        let h = harness();
        assert!(
            h.gateway
                .login("s1", &Identity::new("0000000000"))
                .await
                .is_err()
        );

        let response = single(&h.endpoint, Some("s1"), tool_call(1, "fetch_net_worth")).await;
        let payload: Value = serde_json::from_str(text_payload(&response)).expect("json text");
        assert_eq!(payload["status"], json!("login_required"));
    }

    #[tokio::test]
    async fn sessions_do_not_leak_into_each_other() {
        let h = harness();
        h.gateway
            .login("a", &Identity::new("1010101010"))
            .await
            .expect("login a");

        let response = single(&h.endpoint, Some("b"), tool_call(1, "fetch_net_worth")).await;
        let payload: Value = serde_json::from_str(text_payload(&response)).expect("json text");
        assert_eq!(payload["status"], json!("login_required"));
        assert!(payload["login_url"].as_str().expect("url").contains("sessionId=b"));
    }

    #[tokio::test]
    async fn unknown_tool_on_authenticated_session_is_an_error() {
        let h = harness();
        h.gateway
            .login("s1", &Identity::new("1010101010"))
            .await
            .expect("login");

        let response = single(&h.endpoint, Some("s1"), tool_call(4, "fetch_crypto")).await;

        assert_eq!(response["id"], json!(4));
        assert_eq!(response["error"]["code"], json!(rpc::INVALID_PARAMS));
        assert_eq!(response["error"]["data"]["error"], json!("unknown_tool"));
    }

    #[tokio::test]
    async fn missing_fixture_is_reported_not_fatal() {
        let h = harness();
        h.gateway
            .login("s2", &Identity::new("2020202020"))
            .await
            .expect("login");

        let response = single(&h.endpoint, Some("s2"), tool_call(5, "fetch_net_worth")).await;

        assert_eq!(response["error"]["code"], json!(rpc::FIXTURE_NOT_FOUND));
        assert_eq!(response["error"]["data"]["tool"], json!("fetch_net_worth"));
    }

    #[tokio::test]
    async fn unparsable_body_is_a_parse_error_without_session_side_effects() {
        let h = harness();
        let responses = h.endpoint.handle_body(Some("s1"), b"{not json").await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], json!(rpc::PARSE_ERROR));
        assert_eq!(responses[0]["id"], Value::Null);
        assert!(h.sessions.is_empty());
    }

    #[tokio::test]
    async fn missing_tool_name_is_invalid_request_without_session_side_effects() {
        let h = harness();
        let response = single(
            &h.endpoint,
            Some("s1"),
            json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call", "params": {}}),
        )
        .await;

        assert_eq!(response["id"], json!(9));
        assert_eq!(response["error"]["code"], json!(rpc::INVALID_REQUEST));
        assert!(h.sessions.is_empty());
    }

    #[tokio::test]
    async fn non_object_params_and_non_string_name_are_invalid_requests() {
        let h = harness();
        for params in [json!("fetch_net_worth"), json!({"name": 42})] {
            let response = single(
                &h.endpoint,
                Some("s1"),
                json!({"jsonrpc": "2.0", "id": 10, "method": "tools/call", "params": params}),
            )
            .await;
            assert_eq!(response["error"]["code"], json!(rpc::INVALID_REQUEST));
        }
        assert!(h.sessions.is_empty());
    }

    #[test]
    fn tool_call_request_keeps_envelope_fields() {
        let request = ToolCallRequest::from_params(
            "2.0",
            json!("req-7"),
            &json!({"name": "fetch_epf_details", "arguments": {"year": 2024}}),
        )
        .expect("valid params");

        assert_eq!(request.protocol_version, "2.0");
        assert_eq!(request.request_id, json!("req-7"));
        assert_eq!(request.tool_name, "fetch_epf_details");
        assert_eq!(request.arguments.get("year"), Some(&json!(2024)));
    }

    #[tokio::test]
    async fn missing_method_is_invalid_request() {
        let h = harness();
        let response = single(&h.endpoint, Some("s1"), json!({"jsonrpc": "2.0", "id": 1})).await;
        assert_eq!(response["error"]["code"], json!(rpc::INVALID_REQUEST));
        assert!(h.sessions.is_empty());
    }

    #[tokio::test]
    async fn wrong_protocol_version_is_invalid_request() {
        let h = harness();
        let response = single(
            &h.endpoint,
            Some("s1"),
            json!({"jsonrpc": "1.0", "id": "x", "method": "tools/call"}),
        )
        .await;
        assert_eq!(response["id"], json!("x"));
        assert_eq!(response["error"]["code"], json!(rpc::INVALID_REQUEST));
    }

    #[tokio::test]
    async fn non_object_arguments_are_rejected() {
        let h = harness();
        let response = single(
            &h.endpoint,
            Some("s1"),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "fetch_net_worth", "arguments": [1, 2]}
            }),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(rpc::INVALID_PARAMS));
        assert!(h.sessions.is_empty());
    }

    #[tokio::test]
    async fn tool_call_without_session_header_is_invalid_request() {
        let h = harness();
        let response = single(&h.endpoint, None, tool_call(1, "fetch_net_worth")).await;
        assert_eq!(response["error"]["code"], json!(rpc::INVALID_REQUEST));
        assert!(h.sessions.is_empty());
    }

    #[tokio::test]
    async fn unsupported_method_is_method_not_found() {
        let h = harness();
        let response = single(
            &h.endpoint,
            Some("s1"),
            json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(rpc::METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn tools_list_needs_no_login() {
        let h = harness();
        let response = single(
            &h.endpoint,
            None,
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        )
        .await;
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .expect("tools")
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names.len(), Tool::ALL.len());
        assert!(names.contains(&"fetch_net_worth"));
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let h = harness();
        let responses = h
            .endpoint
            .handle_incoming_message(
                Some("s1"),
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            )
            .await;
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn batches_answer_each_request_in_order() {
        let h = harness();
        let responses = h
            .endpoint
            .handle_incoming_message(
                Some("s1"),
                json!([
                    {"jsonrpc": "2.0", "id": 1, "method": "ping"},
                    {"jsonrpc": "2.0", "method": "notifications/initialized"},
                    {"jsonrpc": "2.0", "id": 2, "method": "initialize", "params": {}}
                ]),
            )
            .await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], json!(1));
        assert_eq!(
            responses[1]["result"]["protocolVersion"],
            json!(MCP_PROTOCOL_VERSION)
        );
    }

    #[tokio::test]
    async fn empty_batch_is_invalid_request() {
        let h = harness();
        let responses = h.endpoint.handle_incoming_message(Some("s1"), json!([])).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], json!(rpc::INVALID_REQUEST));
    }
}
