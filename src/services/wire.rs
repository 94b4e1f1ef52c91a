//! Request envelopes, response unwrapping and method-name routing.
//!
//! Responses are not uniformly shaped: the payload usually sits under the
//! method name, sometimes under some other key, and failures arrive as an
//! `Errors` list inside a 2xx response. `classify_response` names each of
//! those cases explicitly.

use crate::errors::{ClientError, VendorError};
use crate::services::auth::AuthHeader;
use serde::Serialize;
use serde_json::{Map, Value};

const ERRORS_KEYS: &[&str] = &["Errors", "errors"];
const ERROR_CODE_KEYS: &[&str] = &["ErrorCode", "Code", "code"];
const ERROR_MESSAGE_KEYS: &[&str] = &["ErrorMessage", "Message", "message", "Error", "error"];

#[derive(Debug, Clone, Serialize)]
struct Payload<'a> {
    #[serde(rename = "Header")]
    header: &'a AuthHeader,
    #[serde(rename = "Body", skip_serializing_if = "Option::is_none")]
    body: Option<&'a Value>,
}

#[derive(Debug, Clone, Serialize)]
struct Envelope<'a> {
    payload: Payload<'a>,
}

/// `{"payload":{"Header":..,"Body":..}}`. With `omit_body` the `Body` key is
/// absent altogether, which some endpoints require.
pub fn build_request_body(
    header: &AuthHeader,
    body: &Value,
    omit_body: bool,
) -> Result<Value, ClientError> {
    let envelope = Envelope {
        payload: Payload {
            header,
            body: if omit_body { None } else { Some(body) },
        },
    };
    serde_json::to_value(&envelope)
        .map_err(|err| ClientError::unknown(format!("Failed to build request envelope: {}", err)))
}

/// `Client_Search` -> `{base}/{version}/client/search`. Everything after the
/// first underscore is joined and lowercased.
pub fn method_url(base_url: &str, version: &str, method: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = match method.split_once('_') {
        Some((category, action)) => format!(
            "{}/{}",
            category.to_lowercase(),
            action.replace('_', "").to_lowercase()
        ),
        None => method.to_lowercase(),
    };
    format!("{}/{}/{}", base, version, path)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unwrapped {
    /// Payload found under the exact method name.
    Found(Value),
    /// Payload found under some other object key.
    AltFound { key: String, body: Value },
    AppErrors(Vec<VendorError>),
    Malformed,
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(num)) => Some(num.to_string()),
        _ => None,
    })
}

fn vendor_error_from(entry: &Value) -> VendorError {
    match entry {
        Value::String(text) => VendorError {
            code: None,
            message: text.clone(),
        },
        Value::Object(map) => VendorError {
            code: first_string(map, ERROR_CODE_KEYS),
            message: first_string(map, ERROR_MESSAGE_KEYS).unwrap_or_else(|| entry.to_string()),
        },
        other => VendorError {
            code: None,
            message: other.to_string(),
        },
    }
}

/// Accepts `[..]`, `{"Error": [..]}` and `{"Error": ".."}` forms.
fn collect_vendor_errors(raw: &Value) -> Vec<VendorError> {
    match raw {
        Value::Array(items) => items.iter().map(vendor_error_from).collect(),
        Value::Object(map) => match map.get("Error").or_else(|| map.get("error")) {
            Some(Value::Array(items)) => items.iter().map(vendor_error_from).collect(),
            Some(single) => vec![vendor_error_from(single)],
            None if map.is_empty() => Vec::new(),
            None => vec![vendor_error_from(raw)],
        },
        Value::String(text) if !text.trim().is_empty() => vec![vendor_error_from(raw)],
        _ => Vec::new(),
    }
}

fn is_errors_key(key: &str) -> bool {
    ERRORS_KEYS.contains(&key)
}

/// Body of a `{Header, Body}` wrapper. A wrapper without `Body` is returned
/// minus its `Header`.
fn body_of(wrapper: &Map<String, Value>) -> Value {
    if let Some(body) = wrapper.get("Body") {
        return body.clone();
    }
    let mut rest = wrapper.clone();
    rest.remove("Header");
    Value::Object(rest)
}

pub fn classify_response(response: &Value, method: &str) -> Unwrapped {
    let Some(map) = response.as_object() else {
        return Unwrapped::Malformed;
    };

    for key in ERRORS_KEYS {
        if let Some(raw) = map.get(*key) {
            let errors = collect_vendor_errors(raw);
            if !errors.is_empty() {
                return Unwrapped::AppErrors(errors);
            }
        }
    }

    if let Some(Value::Object(wrapper)) = map.get(method) {
        return Unwrapped::Found(body_of(wrapper));
    }

    for (key, value) in map.iter() {
        if key == method || is_errors_key(key) {
            continue;
        }
        if let Value::Object(wrapper) = value {
            return Unwrapped::AltFound {
                key: key.clone(),
                body: body_of(wrapper),
            };
        }
    }

    Unwrapped::Malformed
}

pub fn extract_body(response: &Value, method: &str) -> Result<Value, ClientError> {
    match classify_response(response, method) {
        Unwrapped::Found(body) | Unwrapped::AltFound { body, .. } => Ok(body),
        Unwrapped::AppErrors(errors) => Err(ClientError::application(&errors)),
        Unwrapped::Malformed => Err(ClientError::parse(format!(
            "Unexpected response format for {}",
            method
        ))),
    }
}
