use crate::errors::ConfigError;
use crate::services::api_client::{ApiClient, ClientOptions};
use crate::services::credentials::{CredentialStore, Credentials};
use crate::services::logger::Logger;
use crate::services::transport::HttpTransport;
use std::sync::{Arc, RwLock};

/// Hands out the shared `ApiClient`.
///
/// `client(None)` builds once and then keeps returning the same instance.
/// `client(Some(options))` always builds a fresh client and swaps it in as
/// the new shared one. Concurrent reconfiguration is last-write-wins.
pub struct ClientFactory {
    logger: Logger,
    store: CredentialStore,
    transport: Arc<dyn HttpTransport>,
    default_options: ClientOptions,
    credentials: RwLock<Option<Credentials>>,
    cached: RwLock<Option<Arc<ApiClient>>>,
}

impl ClientFactory {
    pub fn new(
        logger: Logger,
        store: CredentialStore,
        transport: Arc<dyn HttpTransport>,
        default_options: ClientOptions,
    ) -> Self {
        Self {
            logger,
            store,
            transport,
            default_options,
            credentials: RwLock::new(None),
            cached: RwLock::new(None),
        }
    }

    /// Credentials are read from disk once and reused for every client the
    /// factory builds afterwards.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if let Ok(guard) = self.credentials.read() {
            if let Some(existing) = guard.as_ref() {
                return Ok(existing.clone());
            }
        }
        let loaded = self.store.load()?;
        if let Ok(mut guard) = self.credentials.write() {
            *guard = Some(loaded.clone());
        }
        Ok(loaded)
    }

    pub fn client(&self, options: Option<ClientOptions>) -> Result<Arc<ApiClient>, ConfigError> {
        if options.is_none() {
            if let Ok(guard) = self.cached.read() {
                if let Some(existing) = guard.as_ref() {
                    return Ok(existing.clone());
                }
            }
        }

        let options = options.unwrap_or_else(|| self.default_options.clone());
        let client = Arc::new(ApiClient::new(
            self.logger.clone(),
            self.credentials()?,
            self.transport.clone(),
            &options,
        )?);
        self.logger.debug(
            "constructed API client",
            Some(&serde_json::json!({
                "base_url": client.base_url(),
                "timeout_ms": client.timeout().as_millis() as u64,
                "test_mode": client.is_test_mode(),
            })),
        );
        if let Ok(mut guard) = self.cached.write() {
            *guard = Some(client.clone());
        }
        Ok(client)
    }

    pub fn credentials_path(&self) -> &std::path::Path {
        self.store.path()
    }
}
