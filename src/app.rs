use crate::errors::{ConfigError, ToolError};
use crate::managers;
use crate::mcp::catalog::categories;
use crate::services::api_client::ClientOptions;
use crate::services::client_factory::ClientFactory;
use crate::services::credentials::{validate_format, CredentialStore};
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::transport::{HttpTransport, ReqwestTransport};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub factory: Arc<ClientFactory>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let missing: Vec<&str> = categories()
            .into_iter()
            .filter(|category| !handlers.contains_key(*category))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(ToolError::internal(format!(
            "Tool wiring is incomplete: no handler for categories {}",
            missing.join(", ")
        )))
    }

    /// Production startup: credentials from disk, real HTTP, options from the
    /// environment. Any failure here stops the server.
    pub fn initialize() -> Result<Self, ToolError> {
        let logger = Logger::new("quickfile");
        let transport = ReqwestTransport::new()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        let factory = Arc::new(ClientFactory::new(
            logger.clone(),
            CredentialStore::from_env(),
            Arc::new(transport),
            ClientOptions::from_env(),
        ));

        let credentials = factory.credentials()?;
        if !validate_format(&credentials) {
            return Err(ConfigError::InvalidFormat(format!(
                "expected a numeric accountNumber, an apiKey of at least 10 characters and a UUID applicationId in {}",
                factory.credentials_path().display()
            ))
            .into());
        }
        let client = factory.client(None)?;
        logger.info(
            "credentials loaded",
            Some(&serde_json::json!({
                "path": factory.credentials_path().display().to_string(),
                "base_url": client.base_url(),
                "test_mode": client.is_test_mode(),
            })),
        );

        Self::with_factory(logger, factory)
    }

    /// Wires the category managers around an existing factory.
    pub fn with_factory(logger: Logger, factory: Arc<ClientFactory>) -> Result<Self, ToolError> {
        let validation = Validation::new();
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert(
            "system".to_string(),
            Arc::new(managers::system::SystemManager::new(
                logger.clone(),
                validation.clone(),
                factory.clone(),
            )),
        );
        handlers.insert(
            "client".to_string(),
            Arc::new(managers::client::ClientManager::new(
                logger.clone(),
                validation.clone(),
                factory.clone(),
            )),
        );
        handlers.insert(
            "invoice".to_string(),
            Arc::new(managers::invoice::InvoiceManager::new(
                logger.clone(),
                validation.clone(),
                factory.clone(),
            )),
        );
        handlers.insert(
            "purchase".to_string(),
            Arc::new(managers::purchase::PurchaseManager::new(
                logger.clone(),
                validation.clone(),
                factory.clone(),
            )),
        );
        handlers.insert(
            "supplier".to_string(),
            Arc::new(managers::supplier::SupplierManager::new(
                logger.clone(),
                validation.clone(),
                factory.clone(),
            )),
        );
        handlers.insert(
            "bank".to_string(),
            Arc::new(managers::bank::BankManager::new(
                logger.clone(),
                validation.clone(),
                factory.clone(),
            )),
        );
        handlers.insert(
            "report".to_string(),
            Arc::new(managers::report::ReportManager::new(
                logger.clone(),
                validation,
                factory.clone(),
            )),
        );

        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        Ok(Self {
            logger,
            factory,
            tool_executor,
        })
    }

    /// Everything but the transport and credential location is real.
    pub fn with_transport(
        logger: Logger,
        store: CredentialStore,
        transport: Arc<dyn HttpTransport>,
        options: ClientOptions,
    ) -> Result<Self, ToolError> {
        let factory = Arc::new(ClientFactory::new(
            logger.clone(),
            store,
            transport,
            options,
        ));
        Self::with_factory(logger, factory)
    }
}
