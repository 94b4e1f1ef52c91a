mod client_error;
mod config_error;
mod mcp_error;
mod tool_error;
mod validation_error;

pub use client_error::{ClientError, ClientErrorKind, VendorError};
pub use config_error::ConfigError;
pub use mcp_error::{ErrorCode, McpError};
pub use tool_error::ToolError;
pub use validation_error::ValidationError;
