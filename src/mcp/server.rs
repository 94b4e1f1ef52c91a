use crate::app::App;
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::tool_catalog;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, ToolCallParams, PROTOCOL_VERSION};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolExecutor;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

pub const SERVER_NAME: &str = "quickfile-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct McpServer {
    logger: Logger,
    executor: Arc<ToolExecutor>,
}

impl McpServer {
    pub fn new(app: &App) -> Self {
        Self {
            logger: app.logger.child("mcp"),
            executor: app.tool_executor.clone(),
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        json!({"tools": tool_catalog()})
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, McpError> {
        let params: ToolCallParams = serde_json::from_value(params)
            .map_err(|err| McpError::invalid_params(format!("Invalid tools/call params: {}", err)))?;
        if params.name.trim().is_empty() {
            return Err(McpError::invalid_params("Missing tool name"));
        }
        let output = self.executor.call(&params.name, params.arguments).await;
        serde_json::to_value(output)
            .map_err(|err| McpError::new(ErrorCode::InternalError, err.to_string()))
    }

    /// One line of input, at most one line of output. Notifications and
    /// blank lines produce nothing.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        let parsed: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError,
                    "Parse error",
                ))
            }
        };
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(request) => request,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest,
                    "Invalid request",
                ))
            }
        };
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                request.id.unwrap_or(Value::Null),
                ErrorCode::InvalidRequest,
                "Invalid request: jsonrpc must be \"2.0\"",
            ));
        }
        if request.is_notification() {
            self.logger
                .debug("notification", Some(&json!({"method": request.method})));
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.handle_tools_list()),
            "tools/call" => match self.handle_tools_call(request.params).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(err) => JsonRpcResponse::from_error(id, err),
            },
            other => JsonRpcResponse::failure(
                id,
                ErrorCode::MethodNotFound,
                format!("Method not found: {}", other),
            ),
        };
        Some(response)
    }

    /// Line-delimited JSON-RPC until the reader hits EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);
        while let Some(line) = lines.next_line().await? {
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let payload = serde_json::to_string(&response)?;
            writer.write_all(payload.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok(())
    }
}

pub async fn run_stdio() -> Result<(), ToolError> {
    let app = App::initialize()?;
    let server = McpServer::new(&app);
    app.logger.info(
        "server ready",
        Some(&json!({"name": SERVER_NAME, "version": SERVER_VERSION, "tools": tool_catalog().len()})),
    );
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}
