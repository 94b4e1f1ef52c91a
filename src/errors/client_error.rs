use crate::constants::api::VENDOR_NAME;
use serde::Serialize;

pub const CODE_TIMEOUT: &str = "TIMEOUT";
pub const CODE_NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const CODE_PARSE_ERROR: &str = "PARSE_ERROR";
pub const CODE_UNKNOWN: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientErrorKind {
    /// Non-2xx HTTP status.
    Http,
    /// The vendor answered 2xx but reported errors in the envelope.
    Application,
    Timeout,
    Network,
    Parse,
    Unknown,
}

/// One entry from a vendor `Errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorError {
    pub code: Option<String>,
    pub message: String,
}

/// Runtime failure of a remote call. `code` is what callers render and match
/// on: the HTTP status, the vendor's own error code, or one of the fixed
/// transport codes.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub code: String,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn http(status: u16, status_text: &str) -> Self {
        let message = if status_text.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, status_text.trim())
        };
        Self::new(ClientErrorKind::Http, status.to_string(), message)
    }

    /// Vendor-reported errors: the first error decides the code, every
    /// message is kept.
    pub fn application(errors: &[VendorError]) -> Self {
        let code = errors
            .first()
            .and_then(|err| err.code.clone())
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| CODE_UNKNOWN.to_string());
        let messages: Vec<&str> = errors
            .iter()
            .map(|err| err.message.as_str())
            .filter(|msg| !msg.is_empty())
            .collect();
        let message = if messages.is_empty() {
            "The API reported an error without a message".to_string()
        } else {
            messages.join("; ")
        };
        Self::new(ClientErrorKind::Application, code, message)
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::new(
            ClientErrorKind::Timeout,
            CODE_TIMEOUT,
            format!("Request timed out after {}ms", timeout_ms),
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Network, CODE_NETWORK_ERROR, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Parse, CODE_PARSE_ERROR, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Unknown, CODE_UNKNOWN, message)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ClientErrorKind::Timeout
    }

    /// `QuickFile API Error [<code>]: <message>`
    pub fn render(&self) -> String {
        format!("{} API Error [{}]: {}", VENDOR_NAME, self.code, self.message)
    }
}
