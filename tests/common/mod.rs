#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use quickfile_mcp::services::api_client::{ApiClient, ClientOptions};
use quickfile_mcp::services::credentials::Credentials;
use quickfile_mcp::services::logger::Logger;
use quickfile_mcp::services::transport::{HttpTransport, TransportError, TransportResponse};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Serializes tests that touch process environment variables.
pub static ENV_LOCK: Lazy<AsyncMutex<()>> = Lazy::new(|| AsyncMutex::new(()));

pub const ACCOUNT: &str = "6131400000";
pub const API_KEY: &str = "ABCDEF-1234567890";
pub const APP_ID: &str = "4f0b2b3c-8f5e-4c8e-9a7c-1d2e3f4a5b6c";

pub fn credentials() -> Credentials {
    Credentials::new(ACCOUNT, API_KEY, APP_ID)
}

pub fn tmp_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()))
}

pub fn write_credentials_file(contents: &str) -> PathBuf {
    let dir = tmp_path("quickfile-creds");
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("credentials.json");
    std::fs::write(&path, contents).expect("write credentials");
    path
}

pub fn valid_credentials_file() -> PathBuf {
    write_credentials_file(
        &serde_json::json!({
            "accountNumber": ACCOUNT,
            "apiKey": API_KEY,
            "applicationId": APP_ID,
        })
        .to_string(),
    )
}

pub fn ok_json(body: Value) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status: 200,
        status_text: "OK".to_string(),
        body: body.to_string(),
    })
}

pub fn status(status: u16, status_text: &str, body: &str) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status,
        status_text: status_text.to_string(),
        body: body.to_string(),
    })
}

/// `{"<method>": {"Header": {...}, "Body": body}}`, the normal vendor shape.
pub fn vendor_body(method: &str, body: Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(
        method.to_string(),
        serde_json::json!({"Header": {"MessageType": "Response"}, "Body": body}),
    );
    Value::Object(map)
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Value,
}

/// Replays scripted responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .last()
            .cloned()
            .expect("at least one request")
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, TransportError> {
        self.requests.lock().expect("requests lock").push(RecordedRequest {
            url: url.to_string(),
            body: body.clone(),
        });
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response left".to_string())))
    }
}

/// Never answers; only the client timeout ends the call.
pub struct PendingTransport;

#[async_trait]
impl HttpTransport for PendingTransport {
    async fn post_json(&self, _url: &str, _body: &Value) -> Result<TransportResponse, TransportError> {
        std::future::pending().await
    }
}

pub fn client_with(
    logger: Logger,
    transport: Arc<dyn HttpTransport>,
    options: &ClientOptions,
) -> ApiClient {
    ApiClient::new(logger, credentials(), transport, options).expect("client")
}
