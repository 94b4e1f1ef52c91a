use std::path::PathBuf;

/// Startup configuration failures. The server does not proceed past any of
/// these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Credentials file not found at {}. Create it with accountNumber, apiKey and applicationId.", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read credentials file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credentials file {} is not valid JSON: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Credentials file is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Credentials have an invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
