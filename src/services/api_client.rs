use crate::constants::api::{BASE_URL, TIMEOUT_MS, VERSION};
use crate::constants::limits::LOG_BODY_MAX_BYTES;
use crate::constants::{env, protocols::ALLOWED_HTTP};
use crate::errors::{ClientError, ConfigError};
use crate::services::auth::fresh_header;
use crate::services::credentials::Credentials;
use crate::services::logger::Logger;
use crate::services::transport::{HttpTransport, TransportError, TransportResponse};
use crate::services::wire::{build_request_body, extract_body, method_url};
use crate::utils::feature_flags::env_flag;
use crate::utils::redact::{redact_envelope, redact_for_log, redact_json_for_log};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Construction-time settings. Unset fields fall back to the defaults in
/// `constants::api`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    pub timeout_ms: Option<u64>,
    pub test_mode: Option<bool>,
    pub base_url: Option<String>,
}

impl ClientOptions {
    pub fn from_env() -> Self {
        let timeout_ms = std::env::var(env::TIMEOUT_MS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0);
        let test_mode = std::env::var(env::TEST_MODE)
            .ok()
            .map(|_| env_flag(env::TEST_MODE));
        let base_url = std::env::var(env::BASE_URL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self {
            timeout_ms,
            test_mode,
            base_url,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = Some(test_mode);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn resolve_base_url(&self) -> Result<String, ConfigError> {
        let Some(raw) = self.base_url.as_deref() else {
            return Ok(BASE_URL.to_string());
        };
        let parsed = Url::parse(raw)
            .map_err(|err| ConfigError::InvalidBaseUrl(format!("{}: {}", raw, err)))?;
        if !ALLOWED_HTTP.contains(&parsed.scheme()) {
            return Err(ConfigError::InvalidBaseUrl(format!(
                "{}: scheme must be http or https",
                raw
            )));
        }
        Ok(raw.trim_end_matches('/').to_string())
    }
}

/// Per-call knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Leave the `Body` element out of the envelope entirely.
    pub omit_body: bool,
    /// Overrides the client's test-mode flag for this call only.
    pub test_mode: Option<bool>,
}

impl InvokeOptions {
    pub fn omit_body() -> Self {
        Self {
            omit_body: true,
            test_mode: None,
        }
    }

    pub fn with_test_mode(mut self, test_mode: Option<bool>) -> Self {
        self.test_mode = test_mode;
        self
    }
}

pub struct ApiClient {
    logger: Logger,
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: Duration,
    test_mode: AtomicBool,
}

impl ApiClient {
    pub fn new(
        logger: Logger,
        credentials: Credentials,
        transport: Arc<dyn HttpTransport>,
        options: &ClientOptions,
    ) -> Result<Self, ConfigError> {
        let base_url = options.resolve_base_url()?;
        let timeout_ms = options.timeout_ms.unwrap_or(TIMEOUT_MS).max(1);
        Ok(Self {
            logger: logger.child("client"),
            credentials,
            transport,
            base_url,
            timeout: Duration::from_millis(timeout_ms),
            test_mode: AtomicBool::new(options.test_mode.unwrap_or(false)),
        })
    }

    /// For callers that embed the account number in a request body.
    pub fn account_id(&self) -> &str {
        self.credentials.account_id()
    }

    pub fn set_test_mode(&self, enabled: bool) {
        self.test_mode.store(enabled, Ordering::Relaxed);
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode.load(Ordering::Relaxed)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Calls one remote method and returns its unwrapped body.
    ///
    /// Lifecycle: built, sent, then exactly one of succeeded, HTTP error,
    /// vendor error, timeout, network error or parse error. Nothing is
    /// retried.
    pub async fn invoke<B, R>(
        &self,
        method: &str,
        body: &B,
        options: InvokeOptions,
    ) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|err| ClientError::unknown(format!("Failed to serialize request body: {}", err)))?;
        let value = self.invoke_value(method, &body, options).await?;
        serde_json::from_value(value).map_err(|err| {
            ClientError::parse(format!("Unexpected body shape for {}: {}", method, err))
        })
    }

    pub async fn invoke_value(
        &self,
        method: &str,
        body: &Value,
        options: InvokeOptions,
    ) -> Result<Value, ClientError> {
        let test_mode = options.test_mode.unwrap_or_else(|| self.is_test_mode());
        let header = fresh_header(&self.credentials, test_mode);
        let hash_value = header.authentication.hash_value.clone();
        let envelope = build_request_body(&header, body, options.omit_body)?;
        let url = method_url(&self.base_url, VERSION, method);
        let account_id = self.credentials.account_id();
        let secrets = [self.credentials.api_key(), hash_value.as_str()];

        let debug = self.logger.debug_enabled();
        if debug {
            self.logger.debug(
                &format!(
                    "POST {} {}",
                    url,
                    redact_json_for_log(
                        &redact_envelope(&envelope),
                        account_id,
                        &secrets,
                        LOG_BODY_MAX_BYTES
                    )
                ),
                None,
            );
        }

        let response = match self.send(&url, &envelope).await {
            Ok(response) => response,
            Err(err) => {
                self.logger.warn(
                    "request failed",
                    Some(&serde_json::json!({"method": method, "code": err.code})),
                );
                return Err(err);
            }
        };

        if debug {
            self.logger.debug(
                &format!(
                    "response {} {} {}",
                    response.status,
                    response.status_text,
                    redact_for_log(&response.body, account_id, &secrets, LOG_BODY_MAX_BYTES)
                ),
                None,
            );
        }

        let result = self.decode(method, &response);
        if let Err(err) = &result {
            self.logger.warn(
                "call returned an error",
                Some(&serde_json::json!({"method": method, "code": err.code})),
            );
        }
        result
    }

    async fn send(&self, url: &str, envelope: &Value) -> Result<TransportResponse, ClientError> {
        let timeout_ms = self.timeout.as_millis() as u64;
        match tokio::time::timeout(self.timeout, self.transport.post_json(url, envelope)).await {
            Err(_) => Err(ClientError::timeout(timeout_ms)),
            Ok(Err(TransportError::Timeout)) => Err(ClientError::timeout(timeout_ms)),
            Ok(Err(TransportError::Network(message))) => Err(ClientError::network(message)),
            Ok(Err(TransportError::Other(message))) => Err(ClientError::unknown(message)),
            Ok(Ok(response)) => Ok(response),
        }
    }

    fn decode(&self, method: &str, response: &TransportResponse) -> Result<Value, ClientError> {
        if !response.is_success() {
            return Err(ClientError::http(response.status, &response.status_text));
        }
        let parsed: Value = serde_json::from_str(&response.body).map_err(|err| {
            ClientError::parse(format!("Failed to parse {} response as JSON: {}", method, err))
        })?;
        extract_body(&parsed, method)
    }
}
