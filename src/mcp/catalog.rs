use crate::errors::ValidationError;
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const TOOL_PREFIX: &str = "quickfile_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<&'static str, &'static ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .map(|tool| (tool.name.as_str(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<&'static str, JSONSchema>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .map(|tool| {
            let schema = JSONSchema::compile(&tool.input_schema)
                .unwrap_or_else(|err| panic!("invalid input schema for {}: {}", tool.name, err));
            (tool.name.as_str(), schema)
        })
        .collect()
});

pub fn tool_catalog() -> &'static [ToolDef] {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name).copied()
}

/// `quickfile_client_insert_contacts` -> `("client", "insert_contacts")`.
pub fn split_tool_name(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix(TOOL_PREFIX)?;
    let (category, action) = rest.split_once('_')?;
    if category.is_empty() || action.is_empty() {
        return None;
    }
    Some((category, action))
}

/// Categories named by the catalog, sorted and deduplicated.
pub fn categories() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = TOOL_CATALOG
        .iter()
        .filter_map(|tool| split_tool_name(&tool.name).map(|(category, _)| category))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

pub fn suggest_tool_names(name: &str) -> Vec<String> {
    let names: Vec<&str> = TOOL_CATALOG.iter().map(|tool| tool.name.as_str()).collect();
    suggest(name, &names, 3)
}

/// Schema check against the catalog entry. Tools missing from the catalog
/// are left to the executor to reject.
pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), ValidationError> {
    let (Some(tool), Some(schema)) = (tool_by_name(tool_name), TOOL_VALIDATORS.get(tool_name))
    else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let lines: Vec<String> = errors
            .take(10)
            .map(|err| describe_error(&err, &tool.input_schema))
            .collect();
        return Err(ValidationError::new(format!(
            "Invalid arguments for {}: {}",
            tool_name,
            lines.join("; ")
        )));
    }
    Ok(())
}

fn describe_error(err: &jsonschema::ValidationError<'_>, schema: &Value) -> String {
    let path = err.instance_path.to_string();
    let at = if path.is_empty() {
        "(root)".to_string()
    } else {
        path
    };
    match &err.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            let known: Vec<&str> = schema
                .get("properties")
                .and_then(Value::as_object)
                .map(|props| props.keys().map(String::as_str).collect())
                .unwrap_or_default();
            let parts: Vec<String> = unexpected
                .iter()
                .map(|field| {
                    let hints = suggest(field, &known, 1);
                    match hints.first() {
                        Some(hint) => format!("unknown field '{}' (did you mean '{}'?)", field, hint),
                        None => format!("unknown field '{}'", field),
                    }
                })
                .collect();
            format!("{}: {}", at, parts.join(", "))
        }
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            format!("{}: missing required field '{}'", at, name)
        }
        ValidationErrorKind::Type { kind } => format!("{}: expected {}", at, type_name(kind)),
        ValidationErrorKind::Enum { options } => format!("{}: expected one of {}", at, options),
        _ => format!("{}: {}", at, err),
    }
}

fn type_name(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => (*types)
            .into_iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" | "),
    }
}
