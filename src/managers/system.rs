use crate::errors::ToolError;
use crate::managers::common::{
    copy_fields, mutation_options, search_parameters, string_list, unknown_action_error,
    wrapped_list, FieldKind, FieldMap,
};
use crate::services::api_client::{ApiClient, InvokeOptions};
use crate::services::client_factory::ClientFactory;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const SYSTEM_ACTIONS: &[&str] = &["get_account", "search_events", "create_note"];

/// Account detail fields requested when the caller does not name any.
const DEFAULT_ACCOUNT_VARIABLES: &[&str] = &[
    "CompanyName",
    "CompanyNumber",
    "AccountName",
    "Email",
    "Telephone",
    "Address",
    "VatRegNumber",
    "VatRegistered",
    "YearEndDate",
    "CurrencyCode",
    "Website",
];

const NOTE_ENTITIES: &[&str] = &["INVOICE", "ESTIMATE", "PURCHASE", "CLIENT", "SUPPLIER"];

const EVENT_FILTERS: FieldMap = &[
    ("from_date", "FromDate", FieldKind::Date),
    ("to_date", "ToDate", FieldKind::Date),
    ("event_type", "EventType", FieldKind::Text),
];

#[derive(Clone)]
pub struct SystemManager {
    logger: Logger,
    validation: Validation,
    factory: Arc<ClientFactory>,
}

impl SystemManager {
    pub fn new(logger: Logger, validation: Validation, factory: Arc<ClientFactory>) -> Self {
        Self {
            logger: logger.child("system"),
            validation,
            factory,
        }
    }

    fn client(&self) -> Result<Arc<ApiClient>, ToolError> {
        Ok(self.factory.client(None)?)
    }

    pub async fn handle_action(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        match action {
            "get_account" => self.get_account(&args).await,
            "search_events" => self.search_events(&args).await,
            "create_note" => self.create_note(&args).await,
            _ => Err(unknown_action_error("system", action, SYSTEM_ACTIONS)),
        }
    }

    async fn get_account(&self, args: &Value) -> Result<Value, ToolError> {
        let client = self.client()?;
        let variables = string_list(args, "variables")?.unwrap_or_else(|| {
            DEFAULT_ACCOUNT_VARIABLES
                .iter()
                .map(|name| Value::from(*name))
                .collect()
        });
        let body = json!({
            "AccountNumber": client.account_id(),
            "ReturnVariables": wrapped_list("Variable", variables),
        });
        Ok(client
            .invoke_value("System_GetAccountDetails", &body, InvokeOptions::default())
            .await?)
    }

    async fn search_events(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = search_parameters(&self.validation, args, &[])?;
        copy_fields(&self.validation, args, EVENT_FILTERS, &mut params)?;
        let body = json!({"SearchParameters": params});
        Ok(self
            .client()?
            .invoke_value("System_SearchEvents", &body, InvokeOptions::default())
            .await?)
    }

    async fn create_note(&self, args: &Value) -> Result<Value, ToolError> {
        let entity_type = self
            .validation
            .ensure_one_of(args, "entity_type", NOTE_ENTITIES, None)?;
        let entity_id = self.validation.ensure_id(args, "entity_id")?;
        let note = self.validation.ensure_string(args, "note")?;
        let options = mutation_options(&self.validation, args)?;

        let mut details = Map::new();
        details.insert("EntityType".to_string(), Value::from(entity_type.as_str()));
        details.insert("EntityID".to_string(), Value::from(entity_id));
        details.insert("NoteText".to_string(), Value::from(note));
        let body = json!({"NoteDetails": details});

        self.logger.info(
            "creating note",
            Some(&json!({"entity_type": entity_type, "entity_id": entity_id})),
        );
        Ok(self
            .client()?
            .invoke_value("System_CreateNote", &body, options)
            .await?)
    }
}

#[async_trait]
impl ToolHandler for SystemManager {
    async fn handle(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(action, args).await
    }
}
