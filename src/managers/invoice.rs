use crate::errors::{ToolError, ValidationError};
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

const INVOICE_ACTIONS: &[&str] = &["search", "get", "create", "delete", "send", "get_pdf"];

pub(crate) const INVOICE_TYPES: &[&str] = &["INVOICE", "ESTIMATE", "CREDIT", "RECURRING"];
const INVOICE_ORDER_FIELDS: &[&str] = &[
    "InvoiceNumber",
    "IssueDate",
    "ClientName",
    "TotalAmount",
    "DueDate",
];
const INVOICE_STATUSES: &[&str] = &["DRAFT", "SENT", "PAID", "UNPAID", "OVERDUE", "CANCELLED"];

const INVOICE_FILTERS: FieldMap = &[
    ("client_id", "ClientID", FieldKind::Id),
    ("from_date", "FromDate", FieldKind::Date),
    ("to_date", "ToDate", FieldKind::Date),
    ("keyword", "SearchKeyword", FieldKind::Text),
];

const INVOICE_FIELDS: FieldMap = &[
    ("issue_date", "IssueDate", FieldKind::Date),
    ("term_days", "TermDays", FieldKind::Integer),
    ("description", "InvoiceDescription", FieldKind::Text),
    ("po_number", "PONumber", FieldKind::Text),
    ("notes", "Notes", FieldKind::Text),
];

const DEFAULT_CURRENCY: &str = "GBP";
const DEFAULT_VAT_NAME: &str = "VAT";

/// One `ItemLine` from a `{description, unit_cost, quantity, ...}` argument.
pub(crate) fn item_line(
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
    let unit_cost = validation
        .ensure_number(line, "unit_cost")
        .map_err(|err| at(&err.message))?;
    let quantity = validation
        .optional_number(line, "quantity")
        .map_err(|err| at(&err.message))?
        .unwrap_or(1.0);
    if quantity <= 0.0 {
        return Err(at("quantity must be greater than zero"));
    }
    let vat_rate = validation
        .optional_number(line, "vat_rate")
        .map_err(|err| at(&err.message))?;
    if let Some(rate) = vat_rate {
        if !(0.0..=100.0).contains(&rate) {
            return Err(at("vat_rate must be between 0 and 100"));
        }
    }

    let mut item = Map::new();
    item.insert("ItemID".to_string(), Value::from(0));
    let name = validation
        .optional_string(line, "name")
        .map_err(|err| at(&err.message))?;
    item.insert(
        "ItemName".to_string(),
        Value::from(name.unwrap_or_else(|| description.clone())),
    );
    item.insert("ItemDescription".to_string(), Value::from(description));
    if let Some(code) = validation
        .optional_string(line, "nominal_code")
        .map_err(|err| at(&err.message))?
    {
        item.insert("ItemNominalCode".to_string(), Value::from(code));
    }
    item.insert("UnitCost".to_string(), Value::from(unit_cost));
    item.insert("Qty".to_string(), Value::from(quantity));
    if let Some(rate) = vat_rate {
        item.insert(
            "Tax1".to_string(),
            json!({"TaxName": DEFAULT_VAT_NAME, "TaxPercentage": rate}),
        );
    }
    Ok(Value::Object(item))
}

#[derive(Clone)]
pub struct InvoiceManager {
    logger: Logger,
    validation: Validation,
    factory: Arc<ClientFactory>,
}

impl InvoiceManager {
    pub fn new(logger: Logger, validation: Validation, factory: Arc<ClientFactory>) -> Self {
        Self {
            logger: logger.child("invoices"),
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
                let id = self.validation.ensure_id(&args, "invoice_id")?;
                Ok(self
                    .client()?
                    .invoke_value("Invoice_Get", &json!({"InvoiceID": id}), InvokeOptions::default())
                    .await?)
            }
            "create" => self.create(&args).await,
            "delete" => self.delete(&args).await,
            "send" => self.send(&args).await,
            "get_pdf" => {
                let id = self.validation.ensure_id(&args, "invoice_id")?;
                Ok(self
                    .client()?
                    .invoke_value(
                        "Invoice_GetPDF",
                        &json!({"InvoiceID": id}),
                        InvokeOptions::default(),
                    )
                    .await?)
            }
            _ => Err(unknown_action_error("invoice", action, INVOICE_ACTIONS)),
        }
    }

    async fn search(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = search_parameters(&self.validation, args, INVOICE_ORDER_FIELDS)?;
        let invoice_type =
            self.validation
                .ensure_one_of(args, "invoice_type", INVOICE_TYPES, Some("INVOICE"))?;
        params.insert("InvoiceType".to_string(), Value::from(invoice_type));
        if args.get("status").is_some_and(|v| !v.is_null()) {
            let status = self
                .validation
                .ensure_one_of(args, "status", INVOICE_STATUSES, None)?;
            params.insert("Status".to_string(), Value::from(status));
        }
        copy_fields(&self.validation, args, INVOICE_FILTERS, &mut params)?;
        Ok(self
            .client()?
            .invoke_value(
                "Invoice_Search",
                &json!({"SearchParameters": params}),
                InvokeOptions::default(),
            )
            .await?)
    }

    async fn create(&self, args: &Value) -> Result<Value, ToolError> {
        let client_id = self.validation.ensure_id(args, "client_id")?;
        let invoice_type =
            self.validation
                .ensure_one_of(args, "invoice_type", INVOICE_TYPES, Some("INVOICE"))?;
        let currency = self
            .validation
            .optional_string(args, "currency")?
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let lines = self.validation.ensure_array(args, "lines")?;
        let options = mutation_options(&self.validation, args)?;

        let mut items = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            items.push(item_line(&self.validation, index, line)?);
        }

        let mut data = Map::new();
        data.insert("InvoiceType".to_string(), Value::from(invoice_type.as_str()));
        data.insert("ClientID".to_string(), Value::from(client_id));
        data.insert("Currency".to_string(), Value::from(currency));
        copy_fields(&self.validation, args, INVOICE_FIELDS, &mut data)?;
        data.insert(
            "InvoiceLines".to_string(),
            json!({"ItemLines": wrapped_list("ItemLine", items)}),
        );

        self.logger.info(
            "creating invoice",
            Some(&json!({"client_id": client_id, "invoice_type": invoice_type})),
        );
        Ok(self
            .client()?
            .invoke_value("Invoice_Create", &json!({"InvoiceData": data}), options)
            .await?)
    }

    async fn delete(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_id(args, "invoice_id")?;
        let options = mutation_options(&self.validation, args)?;
        self.logger
            .info("deleting invoice", Some(&json!({"invoice_id": id})));
        Ok(self
            .client()?
            .invoke_value(
                "Invoice_Delete",
                &json!({"InvoiceDetails": {"InvoiceID": id}}),
                options,
            )
            .await?)
    }

    async fn send(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_id(args, "invoice_id")?;
        let options = mutation_options(&self.validation, args)?;
        let mut item = Map::new();
        item.insert("InvoiceID".to_string(), Value::from(id));
        if let Some(recipients) = string_list(args, "recipients")? {
            item.insert(
                "EmailRecipients".to_string(),
                wrapped_list("Recipient", recipients),
            );
        }
        if let Some(attach) = self.validation.optional_bool(args, "attach_pdf")? {
            item.insert("AttachPDF".to_string(), Value::from(attach));
        }
        self.logger
            .info("sending invoice", Some(&json!({"invoice_id": id})));
        Ok(self
            .client()?
            .invoke_value("Invoice_Send", &json!({"SendItem": item}), options)
            .await?)
    }
}

#[async_trait]
impl ToolHandler for InvoiceManager {
    async fn handle(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(action, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_line_defaults_quantity_and_name() {
        let line = item_line(
            &Validation::new(),
            0,
            &json!({"description": "Consulting", "unit_cost": 150, "vat_rate": 20}),
        )
        .expect("valid line");
        assert_eq!(line["ItemName"], "Consulting");
        assert_eq!(line["Qty"], 1.0);
        assert_eq!(line["UnitCost"], 150.0);
        assert_eq!(line["Tax1"]["TaxPercentage"], 20.0);
        assert!(line.get("ItemNominalCode").is_none());
    }

    #[test]
    fn item_line_errors_name_the_line() {
        let err = item_line(&Validation::new(), 2, &json!({"description": "x"}))
            .expect_err("unit_cost missing");
        assert!(err.message.starts_with("lines[2]:"), "{}", err.message);

        let err = item_line(
            &Validation::new(),
            0,
            &json!({"description": "x", "unit_cost": 1, "quantity": 0}),
        )
        .expect_err("zero quantity");
        assert!(err.message.contains("quantity"));
    }
}
