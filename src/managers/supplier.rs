use crate::errors::ToolError;
use crate::managers::client::{ensure_has_name, CONTACT_DETAIL_FIELDS};
use crate::managers::common::{
    copy_fields, mutation_options, search_parameters, unknown_action_error, FieldKind, FieldMap,
};
use crate::services::api_client::{ApiClient, InvokeOptions};
use crate::services::client_factory::ClientFactory;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const SUPPLIER_ACTIONS: &[&str] = &["search", "get", "create", "delete"];

const SUPPLIER_ORDER_FIELDS: &[&str] = &["CompanyName", "SupplierID", "DateCreated"];

const SUPPLIER_FILTERS: FieldMap = &[
    ("company_name", "CompanyName", FieldKind::Text),
    ("contact_name", "ContactName", FieldKind::Text),
    ("email", "Email", FieldKind::Text),
    ("postcode", "Postcode", FieldKind::Text),
];

#[derive(Clone)]
pub struct SupplierManager {
    logger: Logger,
    validation: Validation,
    factory: Arc<ClientFactory>,
}

impl SupplierManager {
    pub fn new(logger: Logger, validation: Validation, factory: Arc<ClientFactory>) -> Self {
        Self {
            logger: logger.child("suppliers"),
            validation,
            factory,
        }
    }

    fn client(&self) -> Result<Arc<ApiClient>, ToolError> {
        Ok(self.factory.client(None)?)
    }

    pub async fn handle_action(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        match action {
            "search" => {
                let mut params = search_parameters(&self.validation, &args, SUPPLIER_ORDER_FIELDS)?;
                copy_fields(&self.validation, &args, SUPPLIER_FILTERS, &mut params)?;
                Ok(self
                    .client()?
                    .invoke_value(
                        "Supplier_Search",
                        &json!({"SearchParameters": params}),
                        InvokeOptions::default(),
                    )
                    .await?)
            }
            "get" => {
                let id = self.validation.ensure_id(&args, "supplier_id")?;
                Ok(self
                    .client()?
                    .invoke_value(
                        "Supplier_Get",
                        &json!({"SupplierID": id}),
                        InvokeOptions::default(),
                    )
                    .await?)
            }
            "create" => self.create(&args).await,
            "delete" => {
                let id = self.validation.ensure_id(&args, "supplier_id")?;
                let options = mutation_options(&self.validation, &args)?;
                self.logger
                    .info("deleting supplier", Some(&json!({"supplier_id": id})));
                Ok(self
                    .client()?
                    .invoke_value(
                        "Supplier_Delete",
                        &json!({"SupplierDetails": {"SupplierID": id}}),
                        options,
                    )
                    .await?)
            }
            _ => Err(unknown_action_error("supplier", action, SUPPLIER_ACTIONS)),
        }
    }

    async fn create(&self, args: &Value) -> Result<Value, ToolError> {
        let mut details = Map::new();
        copy_fields(&self.validation, args, CONTACT_DETAIL_FIELDS, &mut details)?;
        ensure_has_name(&details)?;
        if let Some(code) = self.validation.optional_string(args, "default_nominal_code")? {
            details.insert("DefaultNominalCode".to_string(), Value::from(code));
        }
        let options = mutation_options(&self.validation, args)?;
        self.logger.info("creating supplier", None);
        Ok(self
            .client()?
            .invoke_value("Supplier_Create", &json!({"SupplierDetails": details}), options)
            .await?)
    }
}

#[async_trait]
impl ToolHandler for SupplierManager {
    async fn handle(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(action, args).await
    }
}
