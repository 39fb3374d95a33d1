use finmock_core::DispatchError;
use finmock_core::error::codes;
use serde_json::{Value, json};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const FIXTURE_NOT_FOUND: i64 = -32001;

#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    pub fn parse_error() -> Self {
        Self {
            code: PARSE_ERROR,
            message: "Parse error".to_string(),
            data: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_REQUEST,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {method}"),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
            data: None,
        }
    }

    fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<DispatchError> for RpcError {
    fn from(err: DispatchError) -> Self {
        let message = err.to_string();
        match err {
            DispatchError::UnknownTool(unknown) => RpcError {
                code: INVALID_PARAMS,
                message: format!("Unknown tool: {}", unknown.0),
                data: None,
            }
            .with_data(json!({
                "error": codes::UNKNOWN_TOOL,
                "message": message,
                "tool": unknown.0,
                "docs_hint": "Call tools/list for the available tool names."
            })),
            DispatchError::FixtureNotFound { tool, .. } => RpcError {
                code: FIXTURE_NOT_FOUND,
                message: format!("No data available for {tool}"),
                data: None,
            }
            .with_data(json!({
                "error": codes::FIXTURE_NOT_FOUND,
                "message": message,
                "tool": tool.as_str(),
            })),
            DispatchError::Storage(source) => {
                tracing::error!(error = %source, "fixture storage failure");
                RpcError {
                    code: INTERNAL_ERROR,
                    message: "Fixture storage failure".to_string(),
                    data: None,
                }
                .with_data(json!({
                    "error": codes::STORAGE_ERROR,
                    "message": "The fixture backing store could not be read.",
                }))
            }
        }
    }
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn error_response(id: Value, error: RpcError) -> Value {
    let mut payload = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    });
    if let Some(data) = error.data {
        payload["error"]["data"] = data;
    }
    payload
}

/// Wraps `text` as the single text content block of a tool result.
pub fn text_content(text: impl Into<String>) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": text.into()
            }
        ]
    })
}
