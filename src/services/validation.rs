use crate::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex"));

/// Syntactic checks on tool arguments. Business rules are the vendor's job.
#[derive(Clone, Default)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, args: &Value, key: &str) -> Result<String, ValidationError> {
        self.optional_string(args, key)?
            .ok_or_else(|| ValidationError::field(key, format!("{} must be a non-empty string", key)))
    }

    pub fn optional_string(
        &self,
        args: &Value,
        key: &str,
    ) -> Result<Option<String>, ValidationError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Err(ValidationError::field(
                        key,
                        format!("{} must be a non-empty string", key),
                    ))
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Some(_) => Err(ValidationError::field(
                key,
                format!("{} must be a string", key),
            )),
        }
    }

    /// Accepts integers and integer-looking strings, since agents send both.
    pub fn ensure_id(&self, args: &Value, key: &str) -> Result<u64, ValidationError> {
        self.optional_id(args, key)?.ok_or_else(|| {
            ValidationError::field(key, format!("{} must be a positive integer", key))
        })
    }

    pub fn optional_id(&self, args: &Value, key: &str) -> Result<Option<u64>, ValidationError> {
        let invalid = || ValidationError::field(key, format!("{} must be a positive integer", key));
        match args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(num)) => num.as_u64().filter(|n| *n > 0).map(Some).ok_or_else(invalid),
            Some(Value::String(text)) => text
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .map(Some)
                .ok_or_else(invalid),
            Some(_) => Err(invalid()),
        }
    }

    pub fn optional_count(
        &self,
        args: &Value,
        key: &str,
        default: u64,
        max: u64,
    ) -> Result<u64, ValidationError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => {
                let count = value.as_u64().ok_or_else(|| {
                    ValidationError::field(key, format!("{} must be a non-negative integer", key))
                })?;
                if count > max {
                    return Err(ValidationError::field(
                        key,
                        format!("{} must not exceed {}", key, max),
                    ));
                }
                Ok(count)
            }
        }
    }

    pub fn optional_bool(&self, args: &Value, key: &str) -> Result<Option<bool>, ValidationError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(_) => Err(ValidationError::field(
                key,
                format!("{} must be a boolean", key),
            )),
        }
    }

    pub fn optional_number(&self, args: &Value, key: &str) -> Result<Option<f64>, ValidationError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                ValidationError::field(key, format!("{} must be a number", key))
            }),
        }
    }

    pub fn ensure_number(&self, args: &Value, key: &str) -> Result<f64, ValidationError> {
        self.optional_number(args, key)?
            .ok_or_else(|| ValidationError::field(key, format!("{} is required", key)))
    }

    /// `YYYY-MM-DD`, the only date format the API accepts.
    pub fn optional_date(&self, args: &Value, key: &str) -> Result<Option<String>, ValidationError> {
        let Some(text) = self.optional_string(args, key)? else {
            return Ok(None);
        };
        if !DATE_RE.is_match(&text)
            || chrono::NaiveDate::parse_from_str(&text, "%Y-%m-%d").is_err()
        {
            return Err(ValidationError::field(
                key,
                format!("{} must be a date in YYYY-MM-DD format", key),
            ));
        }
        Ok(Some(text))
    }

    pub fn ensure_date(&self, args: &Value, key: &str) -> Result<String, ValidationError> {
        self.optional_date(args, key)?
            .ok_or_else(|| ValidationError::field(key, format!("{} is required", key)))
    }

    pub fn ensure_one_of(
        &self,
        args: &Value,
        key: &str,
        allowed: &[&str],
        default: Option<&str>,
    ) -> Result<String, ValidationError> {
        let value = match self.optional_string(args, key)? {
            Some(value) => value,
            None => match default {
                Some(default) => return Ok(default.to_string()),
                None => {
                    return Err(ValidationError::field(key, format!("{} is required", key)))
                }
            },
        };
        let upper = value.to_uppercase();
        allowed
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(&upper))
            .map(|candidate| candidate.to_string())
            .ok_or_else(|| {
                ValidationError::field(
                    key,
                    format!("{} must be one of: {}", key, allowed.join(", ")),
                )
            })
    }

    pub fn ensure_array<'a>(
        &self,
        args: &'a Value,
        key: &str,
    ) -> Result<&'a Vec<Value>, ValidationError> {
        match args.get(key) {
            Some(Value::Array(items)) if !items.is_empty() => Ok(items),
            _ => Err(ValidationError::field(
                key,
                format!("{} must be a non-empty array", key),
            )),
        }
    }

    pub fn optional_object<'a>(
        &self,
        args: &'a Value,
        key: &str,
    ) -> Result<Option<&'a Map<String, Value>>, ValidationError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(ValidationError::field(
                key,
                format!("{} must be an object", key),
            )),
        }
    }
}
