//! Loading and format checks for the three QuickFile secrets.

use crate::constants::credentials::MIN_API_KEY_LEN;
use crate::errors::ConfigError;
use crate::utils::paths::resolve_credentials_path;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

static ACCOUNT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("account id regex"));

static APPLICATION_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("application id regex")
});

/// Immutable once loaded. `Debug` never prints the secret values.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    account_id: String,
    api_key: String,
    application_id: String,
}

impl Credentials {
    pub fn new(
        account_id: impl Into<String>,
        api_key: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            api_key: api_key.into(),
            application_id: application_id.into(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &"[REDACTED]")
            .field("api_key", &"[REDACTED]")
            .field("application_id", &self.application_id)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCredentials {
    #[serde(alias = "accountId")]
    account_number: Option<String>,
    api_key: Option<String>,
    application_id: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField { field })
}

/// Pure shape check. Never touches the network; callers decide whether a
/// `false` is fatal.
pub fn validate_format(credentials: &Credentials) -> bool {
    ACCOUNT_ID_RE.is_match(&credentials.account_id)
        && credentials.api_key.chars().count() >= MIN_API_KEY_LEN
        && APPLICATION_ID_RE.is_match(&credentials.application_id)
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        Self::new(resolve_credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Credentials, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound {
                path: self.path.clone(),
            });
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        let parsed: RawCredentials =
            serde_json::from_str(&raw).map_err(|source| ConfigError::InvalidJson {
                path: self.path.clone(),
                source,
            })?;
        Ok(Credentials {
            account_id: required(parsed.account_number, "accountNumber")?,
            api_key: required(parsed.api_key, "apiKey")?,
            application_id: required(parsed.application_id, "applicationId")?,
        })
    }
}
