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

const PURCHASE_ACTIONS: &[&str] = &["search", "get", "create", "delete"];

const PURCHASE_ORDER_FIELDS: &[&str] = &["ReceiptDate", "PurchaseNumber", "SupplierName", "Amount"];
const PURCHASE_STATUSES: &[&str] = &["PAID", "UNPAID", "PART_PAID", "OVERDUE"];

const PURCHASE_FILTERS: FieldMap = &[
    ("supplier_id", "SupplierID", FieldKind::Id),
    ("from_date", "FromDate", FieldKind::Date),
    ("to_date", "ToDate", FieldKind::Date),
    ("keyword", "SearchKeyword", FieldKind::Text),
];

const PURCHASE_FIELDS: FieldMap = &[
    ("due_date", "DueDate", FieldKind::Date),
    ("supplier_ref", "SupplierRef", FieldKind::Text),
    ("notes", "Notes", FieldKind::Text),
];

fn purchase_line(
    validation: &Validation,
    index: usize,
    line: &Value,
) -> Result<Value, ValidationError> {
    let at = |message: &str| ValidationError::field("lines", format!("lines[{}]: {}", index, message));
    if !line.is_object() {
        return Err(at("must be an object"));
    }
    let description = validation
        .ensure_string(line, "description")
        .map_err(|err| at(&err.message))?;
    let amount = validation
        .ensure_number(line, "amount")
        .map_err(|err| at(&err.message))?;
    let nominal_code = validation
        .ensure_string(line, "nominal_code")
        .map_err(|err| at(&err.message))?;
    let vat_amount = validation
        .optional_number(line, "vat_amount")
        .map_err(|err| at(&err.message))?;

    let mut item = Map::new();
    item.insert("ItemDescription".to_string(), Value::from(description));
    item.insert("ItemNominalCode".to_string(), Value::from(nominal_code));
    item.insert("SubTotal".to_string(), Value::from(amount));
    if let Some(vat) = vat_amount {
        item.insert("VatAmount".to_string(), Value::from(vat));
    }
    Ok(Value::Object(item))
}

#[derive(Clone)]
pub struct PurchaseManager {
    logger: Logger,
    validation: Validation,
    factory: Arc<ClientFactory>,
}

impl PurchaseManager {
    pub fn new(logger: Logger, validation: Validation, factory: Arc<ClientFactory>) -> Self {
        Self {
            logger: logger.child("purchases"),
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
                let id = self.validation.ensure_id(&args, "purchase_id")?;
                Ok(self
                    .client()?
                    .invoke_value(
                        "Purchase_Get",
                        &json!({"PurchaseID": id}),
                        InvokeOptions::default(),
                    )
                    .await?)
            }
            "create" => self.create(&args).await,
            "delete" => {
                let id = self.validation.ensure_id(&args, "purchase_id")?;
                let options = mutation_options(&self.validation, &args)?;
                self.logger
                    .info("deleting purchase", Some(&json!({"purchase_id": id})));
                Ok(self
                    .client()?
                    .invoke_value(
                        "Purchase_Delete",
                        &json!({"PurchaseDetails": {"PurchaseID": id}}),
                        options,
                    )
                    .await?)
            }
            _ => Err(unknown_action_error("purchase", action, PURCHASE_ACTIONS)),
        }
    }

    async fn search(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = search_parameters(&self.validation, args, PURCHASE_ORDER_FIELDS)?;
        if args.get("status").is_some_and(|v| !v.is_null()) {
            let status = self
                .validation
                .ensure_one_of(args, "status", PURCHASE_STATUSES, None)?;
            params.insert("Status".to_string(), Value::from(status));
        }
        copy_fields(&self.validation, args, PURCHASE_FILTERS, &mut params)?;
        Ok(self
            .client()?
            .invoke_value(
                "Purchase_Search",
                &json!({"SearchParameters": params}),
                InvokeOptions::default(),
            )
            .await?)
    }

    async fn create(&self, args: &Value) -> Result<Value, ToolError> {
        let supplier_id = self.validation.ensure_id(args, "supplier_id")?;
        let receipt_date = self.validation.ensure_date(args, "receipt_date")?;
        let lines = self.validation.ensure_array(args, "lines")?;
        let options = mutation_options(&self.validation, args)?;

        let mut items = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            items.push(purchase_line(&self.validation, index, line)?);
        }

        let mut data = Map::new();
        data.insert("SupplierID".to_string(), Value::from(supplier_id));
        data.insert("ReceiptDate".to_string(), Value::from(receipt_date));
        if let Some(currency) = self.validation.optional_string(args, "currency")? {
            data.insert("Currency".to_string(), Value::from(currency));
        }
        copy_fields(&self.validation, args, PURCHASE_FIELDS, &mut data)?;
        data.insert("ItemLines".to_string(), wrapped_list("ItemLine", items));

        self.logger
            .info("creating purchase", Some(&json!({"supplier_id": supplier_id})));
        Ok(self
            .client()?
            .invoke_value("Purchase_Create", &json!({"PurchaseData": data}), options)
            .await?)
    }
}

#[async_trait]
impl ToolHandler for PurchaseManager {
    async fn handle(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(action, args).await
    }
}
