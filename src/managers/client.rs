use crate::errors::{ToolError, ValidationError};
use crate::managers::common::{
    copy_fields, mutation_options, search_parameters, unknown_action_error, wrapped_list,
    FieldKind, FieldMap,
};
use crate::services::api_client::{ApiClient, InvokeOptions};
use crate::services::client_factory::ClientFactory;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const CLIENT_ACTIONS: &[&str] = &[
    "search",
    "get",
    "create",
    "update",
    "delete",
    "insert_contacts",
];

const CLIENT_ORDER_FIELDS: &[&str] = &["CompanyName", "ClientID", "DateCreated"];

const CLIENT_FILTERS: FieldMap = &[
    ("company_name", "CompanyName", FieldKind::Text),
    ("contact_name", "ContactName", FieldKind::Text),
    ("email", "Email", FieldKind::Text),
    ("postcode", "Postcode", FieldKind::Text),
    ("telephone", "Telephone", FieldKind::Text),
];

/// Shared by clients and suppliers; the vendor uses the same address and
/// contact vocabulary for both.
pub(crate) const CONTACT_DETAIL_FIELDS: FieldMap = &[
    ("company_name", "CompanyName", FieldKind::Text),
    ("title", "Title", FieldKind::Text),
    ("first_name", "FirstName", FieldKind::Text),
    ("surname", "Surname", FieldKind::Text),
    ("email", "Email", FieldKind::Text),
    ("telephone", "Telephone", FieldKind::Text),
    ("mobile", "Mobile", FieldKind::Text),
    ("website", "Website", FieldKind::Text),
    ("address_line1", "AddressLine1", FieldKind::Text),
    ("address_line2", "AddressLine2", FieldKind::Text),
    ("town", "Town", FieldKind::Text),
    ("county", "County", FieldKind::Text),
    ("postcode", "Postcode", FieldKind::Text),
    ("country_iso", "CountryISO", FieldKind::Text),
    ("vat_number", "VatRegNumber", FieldKind::Text),
    ("company_reg_no", "CompanyRegNo", FieldKind::Text),
    ("currency", "Currency", FieldKind::Text),
    ("term_days", "TermDays", FieldKind::Integer),
    ("notes", "Notes", FieldKind::Text),
];

const CONTACT_FIELDS: FieldMap = &[
    ("first_name", "FirstName", FieldKind::Text),
    ("surname", "Surname", FieldKind::Text),
    ("email", "Email", FieldKind::Text),
    ("telephone", "Telephone", FieldKind::Text),
    ("mobile", "Mobile", FieldKind::Text),
    ("is_primary", "IsPrimary", FieldKind::Flag),
];

/// Either a company name or a contact surname identifies a new record.
pub(crate) fn ensure_has_name(details: &Map<String, Value>) -> Result<(), ValidationError> {
    if details.contains_key("CompanyName") || details.contains_key("Surname") {
        return Ok(());
    }
    Err(ValidationError::new("company_name or surname is required"))
}

#[derive(Clone)]
pub struct ClientManager {
    logger: Logger,
    validation: Validation,
    factory: Arc<ClientFactory>,
}

impl ClientManager {
    pub fn new(logger: Logger, validation: Validation, factory: Arc<ClientFactory>) -> Self {
        Self {
            logger: logger.child("clients"),
            validation,
            factory,
        }
    }

    fn client(&self) -> Result<Arc<ApiClient>, ToolError> {
        Ok(self.factory.client(None)?)
    }

    pub async fn handle_action(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        match action {
            "search" => self.search(&args).await,
            "get" => {
                let id = self.validation.ensure_id(&args, "client_id")?;
                Ok(self
                    .client()?
                    .invoke_value("Client_Get", &json!({"ClientID": id}), InvokeOptions::default())
                    .await?)
            }
            "create" => self.create(&args).await,
            "update" => self.update(&args).await,
            "delete" => self.delete(&args).await,
            "insert_contacts" => self.insert_contacts(&args).await,
            _ => Err(unknown_action_error("client", action, CLIENT_ACTIONS)),
        }
    }

    async fn search(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = search_parameters(&self.validation, args, CLIENT_ORDER_FIELDS)?;
        copy_fields(&self.validation, args, CLIENT_FILTERS, &mut params)?;
        Ok(self
            .client()?
            .invoke_value(
                "Client_Search",
                &json!({"SearchParameters": params}),
                InvokeOptions::default(),
            )
            .await?)
    }

    async fn create(&self, args: &Value) -> Result<Value, ToolError> {
        let mut details = Map::new();
        copy_fields(&self.validation, args, CONTACT_DETAIL_FIELDS, &mut details)?;
        ensure_has_name(&details)?;
        let options = mutation_options(&self.validation, args)?;
        self.logger.info("creating client", None);
        Ok(self
            .client()?
            .invoke_value("Client_Create", &json!({"ClientDetails": details}), options)
            .await?)
    }

    async fn update(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_id(args, "client_id")?;
        let mut details = Map::new();
        copy_fields(&self.validation, args, CONTACT_DETAIL_FIELDS, &mut details)?;
        if details.is_empty() {
            return Err(ValidationError::new("at least one field to update is required").into());
        }
        let options = mutation_options(&self.validation, args)?;

        let mut body = Map::new();
        body.insert("ClientID".to_string(), Value::from(id));
        body.extend(details);
        self.logger
            .info("updating client", Some(&json!({"client_id": id})));
        Ok(self
            .client()?
            .invoke_value("Client_Update", &json!({"ClientDetails": body}), options)
            .await?)
    }

    async fn delete(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_id(args, "client_id")?;
        let options = mutation_options(&self.validation, args)?;
        self.logger
            .info("deleting client", Some(&json!({"client_id": id})));
        Ok(self
            .client()?
            .invoke_value(
                "Client_Delete",
                &json!({"ClientDetails": {"ClientID": id}}),
                options,
            )
            .await?)
    }

    async fn insert_contacts(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_id(args, "client_id")?;
        let entries = self.validation.ensure_array(args, "contacts")?;
        let options = mutation_options(&self.validation, args)?;

        let mut contacts = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_object() {
                return Err(ValidationError::field(
                    "contacts",
                    format!("contacts[{}] must be an object", index),
                )
                .into());
            }
            let mut contact = Map::new();
            copy_fields(&self.validation, entry, CONTACT_FIELDS, &mut contact)?;
            if !contact.contains_key("Surname") && !contact.contains_key("FirstName") {
                return Err(ValidationError::field(
                    "contacts",
                    format!("contacts[{}] needs first_name or surname", index),
                )
                .into());
            }
            contacts.push(Value::Object(contact));
        }

        let body = json!({
            "ClientID": id,
            "Contacts": wrapped_list("Contact", contacts),
        });
        Ok(self
            .client()?
            .invoke_value("Client_InsertContacts", &body, options)
            .await?)
    }
}

#[async_trait]
impl ToolHandler for ClientManager {
    async fn handle(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(action, args).await
    }
}
