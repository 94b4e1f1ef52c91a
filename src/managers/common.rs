//! Argument plumbing shared by the category managers.

use crate::constants::limits::{DEFAULT_RETURN_COUNT, MAX_RETURN_COUNT};
use crate::errors::{ToolError, ValidationError};
use crate::services::api_client::InvokeOptions;
use crate::services::validation::Validation;
use serde_json::{Map, Value};

pub(crate) const ORDER_DIRECTIONS: &[&str] = &["ASC", "DESC"];

/// `(argument name, vendor field, kind)` rows used to copy optional fields
/// from tool arguments into a request body.
#[derive(Clone, Copy)]
pub(crate) enum FieldKind {
    Text,
    Date,
    Number,
    Integer,
    Id,
    Flag,
}

pub(crate) type FieldMap = &'static [(&'static str, &'static str, FieldKind)];

pub(crate) fn unknown_action_error(category: &str, action: &str, known: &[&str]) -> ToolError {
    let tools: Vec<String> = known
        .iter()
        .map(|name| format!("quickfile_{}_{}", category, name))
        .collect();
    ToolError::UnknownTool(format!(
        "quickfile_{}_{} (available: {})",
        category,
        action,
        tools.join(", ")
    ))
}

pub(crate) fn copy_fields(
    validation: &Validation,
    args: &Value,
    fields: FieldMap,
    out: &mut Map<String, Value>,
) -> Result<(), ValidationError> {
    for (arg, vendor, kind) in fields {
        let value = match kind {
            FieldKind::Text => validation.optional_string(args, arg)?.map(Value::from),
            FieldKind::Date => validation.optional_date(args, arg)?.map(Value::from),
            FieldKind::Number => validation.optional_number(args, arg)?.map(Value::from),
            FieldKind::Integer => match args.get(*arg) {
                None | Some(Value::Null) => None,
                Some(_) => Some(Value::from(validation.optional_count(args, arg, 0, u64::MAX)?)),
            },
            FieldKind::Id => validation.optional_id(args, arg)?.map(Value::from),
            FieldKind::Flag => validation.optional_bool(args, arg)?.map(Value::from),
        };
        if let Some(value) = value {
            out.insert(vendor.to_string(), value);
        }
    }
    Ok(())
}

/// The paging and ordering block every `*_Search` method takes.
pub(crate) fn search_parameters(
    validation: &Validation,
    args: &Value,
    order_fields: &[&str],
) -> Result<Map<String, Value>, ValidationError> {
    let mut params = Map::new();
    params.insert(
        "ReturnCount".to_string(),
        Value::from(validation.optional_count(
            args,
            "return_count",
            DEFAULT_RETURN_COUNT,
            MAX_RETURN_COUNT,
        )?),
    );
    params.insert(
        "Offset".to_string(),
        Value::from(validation.optional_count(args, "offset", 0, u64::MAX)?),
    );
    if let Some(first) = order_fields.first() {
        let order_by = match validation.optional_string(args, "order_by")? {
            Some(requested) => order_fields
                .iter()
                .find(|field| field.eq_ignore_ascii_case(&requested))
                .ok_or_else(|| {
                    ValidationError::field(
                        "order_by",
                        format!("order_by must be one of: {}", order_fields.join(", ")),
                    )
                })?,
            None => first,
        };
        params.insert("OrderResultsBy".to_string(), Value::from(*order_by));
    }
    params.insert(
        "OrderDirection".to_string(),
        Value::from(validation.ensure_one_of(
            args,
            "order_direction",
            ORDER_DIRECTIONS,
            Some("ASC"),
        )?),
    );
    Ok(params)
}

/// Mutating tools take an optional `test_mode` that overrides the client
/// flag for one call.
pub(crate) fn mutation_options(
    validation: &Validation,
    args: &Value,
) -> Result<InvokeOptions, ValidationError> {
    Ok(InvokeOptions::default().with_test_mode(validation.optional_bool(args, "test_mode")?))
}

/// Vendor `{"Wrapper": {"Item": [...]}}` list shape.
pub(crate) fn wrapped_list(item_key: &str, items: Vec<Value>) -> Value {
    let mut inner = Map::new();
    inner.insert(item_key.to_string(), Value::Array(items));
    Value::Object(inner)
}

pub(crate) fn string_list(
    args: &Value,
    key: &str,
) -> Result<Option<Vec<Value>>, ValidationError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str().map(str::trim) {
                    Some(text) if !text.is_empty() => out.push(Value::from(text)),
                    _ => {
                        return Err(ValidationError::field(
                            key,
                            format!("{} must contain only non-empty strings", key),
                        ))
                    }
                }
            }
            Ok(Some(out))
        }
        Some(_) => Err(ValidationError::field(
            key,
            format!("{} must be an array of strings", key),
        )),
    }
}
