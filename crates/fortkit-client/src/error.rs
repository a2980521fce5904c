//! Client error types.

use reqwest::Method;
use thiserror::Error;
use url::Url;

use crate::credentials::CredentialError;
use crate::domain_error::{ACCESS_TOKEN_VALIDATION_ERRORS, EpicApiError};
use crate::transport::TransportError;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No response was obtained.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Non-success response that is not an Epic error payload.
    #[error("HTTP {status} for {method} {url}")]
    Http {
        status: u16,
        method: Method,
        url: Url,
        /// Response body, lossily decoded.
        body: String,
    },

    /// Epic error payload returned by a protected endpoint.
    #[error(transparent)]
    Epic(#[from] EpicApiError),

    /// The credential refresh that should have fed a retry failed.
    #[error("credential refresh failed: {0}")]
    Refresh(#[from] CredentialError),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Epic(e) => Some(e.status.as_u16()),
            _ => None,
        }
    }

    /// Epic error code, for normalized errors.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Error::Epic(e) => Some(e.error_code()),
            _ => None,
        }
    }

    /// Check if the server rejected the bearer token.
    pub fn is_credential_error(&self) -> bool {
        self.error_code()
            .is_some_and(|code| ACCESS_TOKEN_VALIDATION_ERRORS.contains(&code))
    }

    /// Check if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Timeout(_)))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
