use crate::errors::{ClientError, ClientErrorKind, ToolError, ValidationError};
use crate::managers::common::unknown_action_error;
use crate::services::api_client::{ApiClient, InvokeOptions};
use crate::services::client_factory::ClientFactory;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const REPORT_ACTIONS: &[&str] = &[
    "profit_loss",
    "balance_sheet",
    "vat_obligations",
    "ageing",
    "chart_of_accounts",
    "subscriptions",
];

const VAT_STATUSES: &[&str] = &["O", "F"];
const AGEING_TYPES: &[&str] = &["DEBTOR", "CREDITOR"];

const VAT_UNAVAILABLE_NOTE: &str =
    "VAT obligations are not available for this account (not VAT registered or not connected to HMRC MTD).";

/// Accounts without VAT registration or an MTD connection get a vendor
/// error for this call; that is reported as an empty list. Transport level
/// failures are still errors.
pub(crate) fn vat_obligations_outcome(
    result: Result<Value, ClientError>,
) -> Result<Value, ToolError> {
    match result {
        Ok(body) => Ok(body),
        Err(err) if err.kind == ClientErrorKind::Application => Ok(json!({
            "Obligations": [],
            "note": VAT_UNAVAILABLE_NOTE,
            "detail": err.render(),
        })),
        Err(err) => Err(err.into()),
    }
}

#[derive(Clone)]
pub struct ReportManager {
    logger: Logger,
    validation: Validation,
    factory: Arc<ClientFactory>,
}

impl ReportManager {
    pub fn new(logger: Logger, validation: Validation, factory: Arc<ClientFactory>) -> Self {
        Self {
            logger: logger.child("reports"),
            validation,
            factory,
        }
    }

    fn client(&self) -> Result<Arc<ApiClient>, ToolError> {
        Ok(self.factory.client(None)?)
    }

    pub async fn handle_action(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        match action {
            "profit_loss" => self.profit_loss(&args).await,
            "balance_sheet" => {
                let to_date = self.validation.ensure_date(&args, "to_date")?;
                self.search("Report_BalanceSheet", json!({"ToDate": to_date}))
                    .await
            }
            "vat_obligations" => self.vat_obligations(&args).await,
            "ageing" => {
                let report_type =
                    self.validation
                        .ensure_one_of(&args, "report_type", AGEING_TYPES, Some("DEBTOR"))?;
                let mut params = Map::new();
                params.insert("ReportType".to_string(), Value::from(report_type));
                if let Some(date) = self.validation.optional_date(&args, "as_at_date")? {
                    params.insert("AsAtDate".to_string(), Value::from(date));
                }
                self.search("Report_Ageing", Value::Object(params)).await
            }
            "chart_of_accounts" => self.without_body("Report_ChartOfAccounts").await,
            "subscriptions" => self.without_body("Report_Subscriptions").await,
            _ => Err(unknown_action_error("report", action, REPORT_ACTIONS)),
        }
    }

    async fn search(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        Ok(self
            .client()?
            .invoke_value(
                method,
                &json!({"SearchParameters": params}),
                InvokeOptions::default(),
            )
            .await?)
    }

    async fn without_body(&self, method: &str) -> Result<Value, ToolError> {
        Ok(self
            .client()?
            .invoke_value(method, &Value::Null, InvokeOptions::omit_body())
            .await?)
    }

    async fn profit_loss(&self, args: &Value) -> Result<Value, ToolError> {
        let from_date = self.validation.ensure_date(args, "from_date")?;
        let to_date = self.validation.ensure_date(args, "to_date")?;
        if from_date > to_date {
            return Err(
                ValidationError::field("from_date", "from_date must not be after to_date").into(),
            );
        }
        self.search(
            "Report_ProfitAndLoss",
            json!({"FromDate": from_date, "ToDate": to_date}),
        )
        .await
    }

    async fn vat_obligations(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = Map::new();
        if args.get("status").is_some_and(|v| !v.is_null()) {
            let status = self
                .validation
                .ensure_one_of(args, "status", VAT_STATUSES, None)?;
            params.insert("Status".to_string(), Value::from(status));
        }
        if let Some(date) = self.validation.optional_date(args, "from_date")? {
            params.insert("FromDate".to_string(), Value::from(date));
        }
        if let Some(date) = self.validation.optional_date(args, "to_date")? {
            params.insert("ToDate".to_string(), Value::from(date));
        }

        let result = self
            .client()?
            .invoke_value(
                "Report_VatObligations",
                &json!({"SearchParameters": params}),
                InvokeOptions::default(),
            )
            .await;
        if let Err(err) = &result {
            if err.kind == ClientErrorKind::Application {
                self.logger.info(
                    "VAT obligations unavailable for account",
                    Some(&json!({"code": err.code})),
                );
            }
        }
        vat_obligations_outcome(result)
    }
}

#[async_trait]
impl ToolHandler for ReportManager {
    async fn handle(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(action, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::VendorError;

    #[test]
    fn vendor_errors_become_an_empty_obligation_list() {
        let err = ClientError::application(&[VendorError {
            code: Some("MTD_NOT_CONNECTED".to_string()),
            message: "Not connected".to_string(),
        }]);
        let value = vat_obligations_outcome(Err(err)).expect("suppressed");
        assert_eq!(value["Obligations"], json!([]));
        assert!(value["note"].as_str().is_some_and(|n| n.contains("VAT")));
    }

    #[test]
    fn timeouts_still_fail() {
        let err = vat_obligations_outcome(Err(ClientError::timeout(5))).expect_err("timeout");
        assert_eq!(err.client_error().map(|e| e.code.as_str()), Some("TIMEOUT"));
    }
}
