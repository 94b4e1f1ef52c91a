//! Per-call authentication header for the QuickFile JSON API.
//!
//! Every request carries a fresh submission number and an MD5 over
//! `account number + API key + submission number`. The digest scheme is fixed
//! by the vendor; changing it breaks authentication.

use crate::constants::api::MESSAGE_TYPE;
use crate::constants::limits::SUBMISSION_COUNTER_MODULUS;
use crate::services::credentials::Credentials;
use md5::{Digest, Md5};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static SUBMISSION_COUNTER: AtomicU32 = AtomicU32::new(0);

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Base-36 millisecond timestamp followed by a 4-digit counter. The counter
/// is what guarantees uniqueness when several calls land in the same
/// millisecond; it wraps at 10000.
pub fn generate_submission_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let counter = SUBMISSION_COUNTER.fetch_add(1, Ordering::Relaxed) % SUBMISSION_COUNTER_MODULUS;
    format!("{}{:04}", to_base36(millis), counter)
}

/// Lowercase hex MD5 of the plain concatenation, no separators.
pub fn hash(account_id: &str, api_key: &str, submission_id: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(account_id.as_bytes());
    hasher.update(api_key.as_bytes());
    hasher.update(submission_id.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone, Serialize)]
pub struct Authentication {
    #[serde(rename = "AccNumber")]
    pub account_id: String,
    #[serde(rename = "MD5Value")]
    pub hash_value: String,
    #[serde(rename = "ApplicationID")]
    pub application_id: String,
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("account_id", &"[REDACTED]")
            .field("hash_value", &"[REDACTED]")
            .field("application_id", &self.application_id)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthHeader {
    #[serde(rename = "MessageType")]
    pub message_type: &'static str,
    #[serde(rename = "SubmissionNumber")]
    pub submission_id: String,
    #[serde(rename = "Authentication")]
    pub authentication: Authentication,
    /// Serialized only when set; the vendor rejects unexpected fields.
    #[serde(rename = "TestMode", skip_serializing_if = "Option::is_none")]
    pub test_mode: Option<bool>,
}

pub fn build_header(
    credentials: &Credentials,
    submission_id: &str,
    hash_value: &str,
    test_mode: bool,
) -> AuthHeader {
    AuthHeader {
        message_type: MESSAGE_TYPE,
        submission_id: submission_id.to_string(),
        authentication: Authentication {
            account_id: credentials.account_id().to_string(),
            hash_value: hash_value.to_string(),
            application_id: credentials.application_id().to_string(),
        },
        test_mode: test_mode.then_some(true),
    }
}

/// Submission id, hash and header in one step; one fresh header per call.
pub fn fresh_header(credentials: &Credentials, test_mode: bool) -> AuthHeader {
    let submission_id = generate_submission_id();
    let hash_value = hash(
        credentials.account_id(),
        credentials.api_key(),
        &submission_id,
    );
    build_header(credentials, &submission_id, &hash_value, test_mode)
}
