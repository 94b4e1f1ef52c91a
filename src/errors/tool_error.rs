use super::{ClientError, ConfigError, ValidationError};

/// Everything a tool handler can fail with. Upstream code tells the classes
/// apart by variant; `render` gives the text shown to the agent.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        ToolError::Validation(ValidationError::new(message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ToolError::Internal(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ToolError::Validation(_))
    }

    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            ToolError::Client(err) => Some(err),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            ToolError::Client(err) => err.render(),
            other => format!("Error: {}", other),
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::internal(format!("JSON error: {}", err))
    }
}
