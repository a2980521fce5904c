//! Epic error payloads and their classification.
//!
//! Epic services answer failures with a JSON body such as:
//!
//! ```json
//! {
//!   "errorCode": "errors.com.epicgames.common.oauth.invalid_token",
//!   "errorMessage": "Invalid token",
//!   "messageVars": [],
//!   "numericErrorCode": 1014,
//!   "originatingService": "com.epicgames.account.public",
//!   "intent": "prod"
//! }
//! ```
//!
//! Anything that does not parse into that shape is unclassified.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Error codes meaning the bearer token is invalid or expired.
pub const ACCESS_TOKEN_VALIDATION_ERRORS: [&str; 2] = [
    "errors.com.epicgames.common.authentication.token_verification_failed",
    "errors.com.epicgames.common.oauth.invalid_token",
];

/// Error body returned by Epic services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicErrorPayload {
    pub error_code: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub message_vars: Vec<serde_json::Value>,
    #[serde(default)]
    pub numeric_error_code: Option<i64>,
    #[serde(default)]
    pub originating_service: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
}

impl EpicErrorPayload {
    pub fn new(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            error_message: error_message.into(),
            message_vars: Vec::new(),
            numeric_error_code: None,
            originating_service: None,
            intent: None,
        }
    }

    /// Whether the code says the bearer token was rejected.
    pub fn is_credential_error(&self) -> bool {
        ACCESS_TOKEN_VALIDATION_ERRORS.contains(&self.error_code.as_str())
    }
}

/// Outcome of sniffing a failed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainErrorClass {
    Recognized(EpicErrorPayload),
    Unrecognized,
}

impl DomainErrorClass {
    /// Classify a response body. Bodies that are not an Epic payload fail closed.
    pub fn classify(body: &[u8]) -> Self {
        // Derived structs also accept JSON arrays, so require an object first
        let value = match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            _ => return DomainErrorClass::Unrecognized,
        };

        match serde_json::from_value::<EpicErrorPayload>(value) {
            Ok(payload) => DomainErrorClass::Recognized(payload),
            Err(_) => DomainErrorClass::Unrecognized,
        }
    }

    pub fn is_credential_error(&self) -> bool {
        matches!(self, DomainErrorClass::Recognized(p) if p.is_credential_error())
    }
}

/// Normalized Epic error, tied to the request that produced it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Epic API error ({status}) {}: {}", .payload.error_code, .payload.error_message)]
pub struct EpicApiError {
    pub payload: EpicErrorPayload,
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
}

impl EpicApiError {
    pub fn error_code(&self) -> &str {
        &self.payload.error_code
    }

    pub fn message(&self) -> &str {
        &self.payload.error_message
    }

    pub fn numeric_code(&self) -> Option<i64> {
        self.payload.numeric_error_code
    }
}
