//! Core error types for the Graph API pipeline.

use thiserror::Error;

/// Errors produced while building, sending, or interpreting a Graph API
/// request.
///
/// Transport-level faults that carry no response (`ConnectionError`,
/// `TimeoutError`, `HttpError`) propagate to the caller unchanged; faults
/// that carry a response are turned into structured results or into the
/// `ApiError`/`OAuthError` variants by the response processor.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Generic HTTP/transport error without a response
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Connection-level failure (DNS, refused, reset)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The transport timed out before a response arrived
    #[error("Request timed out: {0}")]
    TimeoutError(String),

    /// I/O failure while streaming a request body or reading a response
    #[error("I/O error: {0}")]
    IoError(String),

    /// Response body was not valid JSON
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Structured Graph API error payload
    #[error("Graph API error {code}: {message}")]
    ApiError {
        /// Graph error code (e.g. 100 for unsupported requests)
        code: i64,
        /// Error type string from the payload (e.g. `GraphMethodException`)
        error_type: Option<String>,
        message: String,
        /// Finer-grained subcode when present
        subcode: Option<i64>,
        /// The raw `"error"` object for callers that need every field
        details: Option<serde_json::Value>,
    },

    /// `OAuthException` payload (invalid/expired token, code 190 family)
    #[error("OAuth error {code}: {message}")]
    OAuthError { code: i64, message: String },

    /// Client construction or configuration problem
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Caller-supplied parameter was rejected before sending
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Coarse-grained error category for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Timeout,
    Io,
    Parsing,
    Api,
    Authentication,
    Configuration,
    Validation,
}

impl GraphError {
    /// Convenience constructor for a plain API error payload.
    pub fn api_error(code: i64, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            error_type: None,
            message: message.into(),
            subcode: None,
            details: None,
        }
    }

    /// Map this error to a coarse category.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::ConnectionError(_) => ErrorCategory::Network,
            Self::TimeoutError(_) => ErrorCategory::Timeout,
            Self::IoError(_) => ErrorCategory::Io,
            Self::JsonError(_) => ErrorCategory::Parsing,
            Self::ApiError { .. } => ErrorCategory::Api,
            Self::OAuthError { .. } => ErrorCategory::Authentication,
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::InvalidParameter(_) => ErrorCategory::Validation,
        }
    }

    /// Whether a higher layer may reasonably retry the request.
    ///
    /// Graph codes 1 and 2 are documented as transient ("unknown error",
    /// "service temporarily unavailable"); 4, 17 and 341 are throttling.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::TimeoutError(_) => true,
            Self::ApiError { code, .. } => matches!(code, 1 | 2 | 4 | 17 | 341),
            _ => false,
        }
    }

    /// Graph error code when this is a structured API/OAuth error.
    pub const fn graph_code(&self) -> Option<i64> {
        match self {
            Self::ApiError { code, .. } | Self::OAuthError { code, .. } => Some(*code),
            _ => None,
        }
    }
}
