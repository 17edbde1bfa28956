//! Error types for hubbridge
//!
//! Every fallible path in the gateway returns [`GatewayError`]. The variants
//! form the stable error taxonomy surfaced to HTTP callers; see
//! [`crate::http::AppError`] for the status-code mapping.

use serde_json::Value;
use thiserror::Error;

/// Main error type for gateway operations
///
/// `Clone` so one refresh outcome can be handed to every caller waiting on
/// the same in-flight refresh.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("OAuth client is misconfigured: {0}")]
    MisconfiguredClient(String),

    #[error("No connected account; run the authorization flow first")]
    NotAuthenticated,

    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed {
        status: Option<u16>,
        body: Option<Value>,
        message: String,
    },

    #[error("Token refresh failed: {message}")]
    TokenRefreshFailed {
        status: Option<u16>,
        body: Option<Value>,
        message: String,
    },

    #[error("Upstream call failed: {message}")]
    UpstreamCallFailed {
        status: Option<u16>,
        body: Option<Value>,
        message: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Json(err.to_string())
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(err: validator::ValidationErrors) -> Self {
        GatewayError::Validation(err.to_string())
    }
}

/// Convenient result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Create a validation error
    #[inline]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        GatewayError::Validation(msg.into())
    }

    /// Create a config error
    #[inline]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GatewayError::Config(msg.into())
    }

    /// Create a misconfigured-client error
    #[inline]
    pub fn misconfigured<S: Into<String>>(msg: S) -> Self {
        GatewayError::MisconfiguredClient(msg.into())
    }

    /// Create an upstream failure from a non-2xx response
    pub fn upstream(status: u16, body: Value) -> Self {
        GatewayError::UpstreamCallFailed {
            status: Some(status),
            message: format!("upstream responded with HTTP {}", status),
            body: Some(body),
        }
    }

    /// Create an upstream failure where no response was received
    pub fn upstream_unreachable<S: Into<String>>(msg: S) -> Self {
        GatewayError::UpstreamCallFailed {
            status: None,
            body: None,
            message: msg.into(),
        }
    }

    /// Stable machine-readable kind, used as the `type` of HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::MisconfiguredClient(_) => "misconfigured_client",
            GatewayError::NotAuthenticated => "not_authenticated",
            GatewayError::TokenExchangeFailed { .. } => "token_exchange_failed",
            GatewayError::TokenRefreshFailed { .. } => "token_refresh_failed",
            GatewayError::UpstreamCallFailed { .. } => "upstream_call_failed",
            GatewayError::Validation(_) => "validation_failed",
            GatewayError::Config(_) | GatewayError::Io(_) | GatewayError::Json(_) => {
                "internal_error"
            }
        }
    }

    /// Upstream HTTP status, when the failure came from an upstream response
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            GatewayError::TokenExchangeFailed { status, .. }
            | GatewayError::TokenRefreshFailed { status, .. }
            | GatewayError::UpstreamCallFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Verbatim upstream response body, when one was received
    pub fn upstream_body(&self) -> Option<&Value> {
        match self {
            GatewayError::TokenExchangeFailed { body, .. }
            | GatewayError::TokenRefreshFailed { body, .. }
            | GatewayError::UpstreamCallFailed { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}
