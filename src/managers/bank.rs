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

const BANK_ACTIONS: &[&str] = &[
    "get_accounts",
    "get_balances",
    "search",
    "create_account",
    "create_transaction",
];

const ACCOUNT_TYPES: &[&str] = &[
    "CURRENT",
    "PETTY",
    "BUSINESS",
    "LOAN",
    "MERCHANT",
    "EQUITY",
    "CREDITCARD",
    "RESERVE",
];
const TRANSACTION_ORDER_FIELDS: &[&str] = &["TransactionDate", "Amount", "Reference"];

const TRANSACTION_FILTERS: FieldMap = &[
    ("from_date", "FromDate", FieldKind::Date),
    ("to_date", "ToDate", FieldKind::Date),
    ("reference", "Reference", FieldKind::Text),
    ("min_amount", "AmountFrom", FieldKind::Number),
    ("max_amount", "AmountTo", FieldKind::Number),
    ("tagged", "Tagged", FieldKind::Flag),
];

const ACCOUNT_FIELDS: FieldMap = &[
    ("currency", "Currency", FieldKind::Text),
    ("opening_balance", "OpeningBalance", FieldKind::Number),
    ("bank_name", "BankName", FieldKind::Text),
    ("sort_code", "SortCode", FieldKind::Text),
    ("account_number", "AccountNumber", FieldKind::Text),
];

const TRANSACTION_FIELDS: FieldMap = &[
    ("payee", "PayeePayer", FieldKind::Text),
    ("notes", "Notes", FieldKind::Text),
];

#[derive(Clone)]
pub struct BankManager {
    logger: Logger,
    validation: Validation,
    factory: Arc<ClientFactory>,
}

impl BankManager {
    pub fn new(logger: Logger, validation: Validation, factory: Arc<ClientFactory>) -> Self {
        Self {
            logger: logger.child("bank"),
            validation,
            factory,
        }
    }

    fn client(&self) -> Result<Arc<ApiClient>, ToolError> {
        Ok(self.factory.client(None)?)
    }

    pub async fn handle_action(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        match action {
            "get_accounts" => self.get_accounts(&args).await,
            "get_balances" => self.get_balances(&args).await,
            "search" => self.search(&args).await,
            "create_account" => self.create_account(&args).await,
            "create_transaction" => self.create_transaction(&args).await,
            _ => Err(unknown_action_error("bank", action, BANK_ACTIONS)),
        }
    }

    async fn get_accounts(&self, args: &Value) -> Result<Value, ToolError> {
        let mut params = Map::new();
        params.insert("OrderResultsBy".to_string(), Value::from("Position"));
        if let Some(types) = string_list(args, "account_types")? {
            let mut normalized = Vec::with_capacity(types.len());
            for entry in &types {
                let wrapped = json!({"account_types": entry});
                normalized.push(Value::from(self.validation.ensure_one_of(
                    &wrapped,
                    "account_types",
                    ACCOUNT_TYPES,
                    None,
                )?));
            }
            params.insert(
                "AccountTypes".to_string(),
                wrapped_list("AccountType", normalized),
            );
        }
        Ok(self
            .client()?
            .invoke_value(
                "Bank_GetAccounts",
                &json!({"SearchParameters": params}),
                InvokeOptions::default(),
            )
            .await?)
    }

    async fn get_balances(&self, args: &Value) -> Result<Value, ToolError> {
        let codes = self.validation.ensure_array(args, "nominal_codes")?;
        let mut normalized = Vec::with_capacity(codes.len());
        for code in codes {
            match code {
                Value::Number(num) if num.as_u64().is_some() => normalized.push(code.clone()),
                Value::String(text) if text.trim().parse::<u64>().is_ok() => {
                    normalized.push(Value::from(text.trim()))
                }
                _ => {
                    return Err(ToolError::invalid_params(
                        "nominal_codes must contain numeric nominal codes",
                    ))
                }
            }
        }
        let body = json!({"NominalCodes": wrapped_list("NominalCode", normalized)});
        Ok(self
            .client()?
            .invoke_value("Bank_GetAccountBalances", &body, InvokeOptions::default())
            .await?)
    }

    async fn search(&self, args: &Value) -> Result<Value, ToolError> {
        let nominal_code = self.validation.ensure_string(args, "nominal_code")?;
        let mut params = search_parameters(&self.validation, args, TRANSACTION_ORDER_FIELDS)?;
        params.insert("NominalCode".to_string(), Value::from(nominal_code));
        copy_fields(&self.validation, args, TRANSACTION_FILTERS, &mut params)?;
        Ok(self
            .client()?
            .invoke_value(
                "Bank_Search",
                &json!({"SearchParameters": params}),
                InvokeOptions::default(),
            )
            .await?)
    }

    async fn create_account(&self, args: &Value) -> Result<Value, ToolError> {
        let name = self.validation.ensure_string(args, "account_name")?;
        let account_type = self
            .validation
            .ensure_one_of(args, "account_type", ACCOUNT_TYPES, None)?;
        let options = mutation_options(&self.validation, args)?;

        let mut account = Map::new();
        account.insert("AccountName".to_string(), Value::from(name.as_str()));
        account.insert("AccountType".to_string(), Value::from(account_type));
        copy_fields(&self.validation, args, ACCOUNT_FIELDS, &mut account)?;

        self.logger
            .info("creating bank account", Some(&json!({"account_name": name})));
        Ok(self
            .client()?
            .invoke_value("Bank_CreateAccount", &json!({"BankAccount": account}), options)
            .await?)
    }

    async fn create_transaction(&self, args: &Value) -> Result<Value, ToolError> {
        let nominal_code = self.validation.ensure_string(args, "nominal_code")?;
        let date = self.validation.ensure_date(args, "date")?;
        let amount = self.validation.ensure_number(args, "amount")?;
        let reference = self.validation.ensure_string(args, "reference")?;
        let options = mutation_options(&self.validation, args)?;

        let mut transaction = Map::new();
        transaction.insert("BankNominalCode".to_string(), Value::from(nominal_code.as_str()));
        transaction.insert("Date".to_string(), Value::from(date));
        transaction.insert("Reference".to_string(), Value::from(reference));
        transaction.insert("Amount".to_string(), Value::from(amount));
        copy_fields(&self.validation, args, TRANSACTION_FIELDS, &mut transaction)?;

        self.logger.info(
            "creating bank transaction",
            Some(&json!({"nominal_code": nominal_code})),
        );
        Ok(self
            .client()?
            .invoke_value(
                "Bank_CreateTransaction",
                &json!({"Transaction": transaction}),
                options,
            )
            .await?)
    }
}

#[async_trait]
impl ToolHandler for BankManager {
    async fn handle(&self, action: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_action(action, args).await
    }
}
