use crate::errors::{ErrorCode, McpError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Requests without an id get no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// `tools/call` params.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code: code.as_i32(),
                message: message.into(),
            }),
        }
    }

    pub fn from_error(id: Value, err: McpError) -> Self {
        Self::failure(id, err.code, err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_have_no_id() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert!(parsed.is_notification());
        assert!(parsed.params.is_null());
    }

    #[test]
    fn failures_serialize_numeric_codes() {
        let response = JsonRpcResponse::failure(serde_json::json!(3), ErrorCode::MethodNotFound, "Method not found");
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
        assert_eq!(value["jsonrpc"], "2.0");
    }

    #[test]
    fn tool_call_params_default_arguments() {
        let parsed: ToolCallParams =
            serde_json::from_str(r#"{"name":"quickfile_report_subscriptions"}"#).expect("parse");
        assert!(parsed.arguments.is_null());
    }
}
