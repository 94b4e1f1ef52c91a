use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::ToolError;
use crate::mcp::catalog::{split_tool_name, suggest_tool_names, tool_by_name, validate_tool_args};
use crate::services::logger::Logger;

/// One tool category. `action` is the tool name with the
/// `quickfile_<category>_` prefix removed.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, action: &str, args: Value) -> Result<Value, ToolError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// The `tools/call` result shape: one text block, flagged when it carries
/// an error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn success(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self::text(text)
    }

    pub fn failure(err: &ToolError) -> Self {
        let mut out = Self::text(err.render());
        out.is_error = true;
        out
    }

    pub fn first_text(&self) -> &str {
        self.content.first().map(|block| block.text.as_str()).unwrap_or("")
    }
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.handlers.contains_key(category)
    }

    fn unknown_tool(&self, name: &str) -> ToolError {
        let suggestions = suggest_tool_names(name);
        if suggestions.is_empty() {
            ToolError::UnknownTool(name.to_string())
        } else {
            ToolError::UnknownTool(format!(
                "{} (did you mean {}?)",
                name,
                suggestions.join(", ")
            ))
        }
    }

    /// Validates arguments and routes the call by category prefix.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        if tool_by_name(name).is_none() {
            return Err(self.unknown_tool(name));
        }
        let Some((category, action)) = split_tool_name(name) else {
            return Err(self.unknown_tool(name));
        };
        let Some(handler) = self.handlers.get(category) else {
            return Err(self.unknown_tool(name));
        };
        let args = match args {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => args,
            _ => return Err(ToolError::invalid_params("Tool arguments must be an object")),
        };
        validate_tool_args(name, &args)?;
        handler.handle(action, args).await
    }

    /// `execute`, rendered for the MCP client. Never fails: errors become an
    /// `isError` result.
    pub async fn call(&self, name: &str, args: Value) -> ToolOutput {
        let started = Instant::now();
        let result = self.execute(name, args).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                self.logger.info(
                    "tool call succeeded",
                    Some(&serde_json::json!({"tool": name, "duration_ms": duration_ms})),
                );
                ToolOutput::success(&value)
            }
            Err(err) => {
                let code = err.client_error().map(|e| e.code.clone());
                self.logger.warn(
                    "tool call failed",
                    Some(&serde_json::json!({
                        "tool": name,
                        "duration_ms": duration_ms,
                        "code": code,
                        "validation": err.is_validation(),
                    })),
                );
                ToolOutput::failure(&err)
            }
        }
    }
}
