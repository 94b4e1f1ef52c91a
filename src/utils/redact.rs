use crate::constants::redaction::PLACEHOLDER;
use crate::utils::text::clip_for_log;
use serde_json::Value;

/// Fields inside `Header.Authentication` that must never reach a log line.
/// `ApplicationID` is deliberately absent: it identifies the integration, not
/// the account.
const SECRET_AUTH_FIELDS: &[&str] = &["AccNumber", "MD5Value"];

fn redact_authentication(auth: &mut Value) {
    if let Some(map) = auth.as_object_mut() {
        for key in SECRET_AUTH_FIELDS {
            if let Some(entry) = map.get_mut(*key) {
                *entry = Value::String(PLACEHOLDER.to_string());
            }
        }
    }
}

/// Copy of a request envelope with the authentication secrets replaced.
/// Accepts the full `{payload: {Header}}` form or a bare header.
pub fn redact_envelope(envelope: &Value) -> Value {
    let mut out = envelope.clone();
    let header = if out.get("payload").is_some() {
        out.get_mut("payload").and_then(|p| p.get_mut("Header"))
    } else if out.get("Header").is_some() {
        out.get_mut("Header")
    } else {
        Some(&mut out)
    };
    if let Some(auth) = header.and_then(|h| h.get_mut("Authentication")) {
        redact_authentication(auth);
    }
    out
}

/// Replaces every literal occurrence of the given secrets. Empty needles are
/// skipped; longer needles go first so a secret containing another is fully
/// masked.
pub fn scrub_secrets(text: &str, secrets: &[&str]) -> String {
    let mut needles: Vec<&str> = secrets
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    needles.sort_by_key(|s| std::cmp::Reverse(s.len()));
    let mut out = text.to_string();
    for needle in needles {
        if out.contains(needle) {
            out = out.replace(needle, PLACEHOLDER);
        }
    }
    out
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')
}

/// Masks the account id only where it stands as a whole token, so ids that
/// merely contain its digits are left intact.
pub fn mask_account_id(text: &str, account_id: &str) -> String {
    let needle = account_id.trim();
    if needle.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(needle) {
        let end = start + needle.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        if before.is_some_and(is_token_char) || after.is_some_and(is_token_char) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(PLACEHOLDER);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

/// Copy of `value` with every string or number equal to the account id
/// replaced.
pub fn mask_account_values(value: &Value, account_id: &str) -> Value {
    let needle = account_id.trim();
    if needle.is_empty() {
        return value.clone();
    }
    match value {
        Value::String(text) if text.trim() == needle => Value::String(PLACEHOLDER.to_string()),
        Value::Number(number) if number.to_string() == needle => {
            Value::String(PLACEHOLDER.to_string())
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| mask_account_values(item, needle))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), mask_account_values(item, needle)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Debug text for a JSON document: account id masked by value, then the
/// literal secrets scrubbed, then length-capped.
pub fn redact_json_for_log(
    value: &Value,
    account_id: &str,
    secrets: &[&str],
    max_bytes: usize,
) -> String {
    let rendered = serde_json::to_string(&mask_account_values(value, account_id))
        .unwrap_or_default();
    clip_for_log(&scrub_secrets(&rendered, secrets), max_bytes)
}

/// Debug text for a raw body. JSON bodies go through
/// [`redact_json_for_log`]; anything else masks the account id by token.
pub fn redact_for_log(text: &str, account_id: &str, secrets: &[&str], max_bytes: usize) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => redact_json_for_log(&value, account_id, secrets, max_bytes),
        Err(_) => clip_for_log(
            &scrub_secrets(&mask_account_id(text, account_id), secrets),
            max_bytes,
        ),
    }
}
