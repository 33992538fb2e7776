//! Typed error handling for exposed endpoints
//!
//! Every failure an endpoint can produce is one of a small number of kinds,
//! each with a machine-readable code and an HTTP status.
//!
//! # Error Categories
//!
//! - [`DefinitionError`]: load-time problems with endpoint definitions (fatal)
//! - [`RequestError`]: unknown endpoints and malformed filter parameters
//! - [`FetchError`]: failures of the entity-fetch collaborator
//! - [`ConfigError`]: configuration file loading problems
//!
//! # Example
//!
//! ```rust,ignore
//! use expose::prelude::*;
//!
//! match state.handle("1.0", "topics.json", &params).await {
//!     Ok(body) => println!("{}", body),
//!     Err(ApiError::Request(RequestError::InvalidFilter { parameter, .. })) => {
//!         println!("bad parameter {}", parameter);
//!     }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// The main error type for exposed endpoints
#[derive(Debug)]
pub enum ApiError {
    /// Endpoint definition errors (load time)
    Definition(DefinitionError),

    /// Per-request errors caused by the caller
    Request(RequestError),

    /// Collaborator fetch errors
    Fetch(FetchError),

    /// Configuration loading errors
    Config(ConfigError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Definition(e) => write!(f, "{}", e),
            ApiError::Request(e) => write!(f, "{}", e),
            ApiError::Fetch(e) => write!(f, "{}", e),
            ApiError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Definition(e) => Some(e),
            ApiError::Request(e) => Some(e),
            ApiError::Fetch(e) => Some(e),
            ApiError::Config(e) => Some(e),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Definition(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Request(e) => e.status_code(),
            ApiError::Fetch(e) => e.status_code(),
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Definition(e) => e.error_code(),
            ApiError::Request(e) => e.error_code(),
            ApiError::Fetch(e) => e.error_code(),
            ApiError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Convert to an error response
    ///
    /// Collaborator failure causes stay in the logs; only the kind reaches
    /// the caller.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ApiError::Fetch(FetchError::Failed { .. }) => "Entity fetch failed".to_string(),
            ApiError::Definition(_) | ApiError::Config(_) => {
                "Endpoint configuration error".to_string()
            }
            _ => self.to_string(),
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Request(RequestError::InvalidFilter { parameter, .. }) => {
                Some(serde_json::json!({ "parameter": parameter }))
            }
            ApiError::Request(RequestError::NotFound { version, path }) => {
                Some(serde_json::json!({ "version": version, "path": path }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Definition Errors
// =============================================================================

/// Errors raised while registering endpoint definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// A required key is missing or the definition is structurally unsound
    Invalid { endpoint: String, message: String },

    /// Another definition already claimed this (version, path)
    Duplicate { version: String, path: String },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionError::Invalid { endpoint, message } => {
                write!(f, "Invalid endpoint definition '{}': {}", endpoint, message)
            }
            DefinitionError::Duplicate { version, path } => {
                write!(
                    f,
                    "Endpoint /api/{}/{} is already registered",
                    version, path
                )
            }
        }
    }
}

impl std::error::Error for DefinitionError {}

impl DefinitionError {
    pub fn invalid(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        DefinitionError::Invalid {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DefinitionError::Invalid { .. } => "INVALID_DEFINITION",
            DefinitionError::Duplicate { .. } => "DUPLICATE_ENDPOINT",
        }
    }
}

impl From<DefinitionError> for ApiError {
    fn from(err: DefinitionError) -> Self {
        ApiError::Definition(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors caused by the incoming request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// No endpoint is registered for this version and path
    NotFound { version: String, path: String },

    /// A declared filter parameter carries an unusable value
    InvalidFilter { parameter: String, message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::NotFound { version, path } => {
                write!(f, "No endpoint at /api/{}/{}", version, path)
            }
            RequestError::InvalidFilter { parameter, message } => {
                write!(f, "Invalid filter parameter '{}': {}", parameter, message)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn invalid_filter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        RequestError::InvalidFilter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RequestError::InvalidFilter { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::NotFound { .. } => "ENDPOINT_NOT_FOUND",
            RequestError::InvalidFilter { .. } => "INVALID_FILTER",
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::Request(err)
    }
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors surfaced by the entity-fetch collaborator
///
/// These are never retried here; retry policy belongs to the collaborator.
#[derive(Debug)]
pub enum FetchError {
    /// The collaborator did not answer within the configured timeout
    Timeout { timeout: Duration },

    /// The collaborator answered with an error
    Failed { source: anyhow::Error },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout { timeout } => {
                write!(f, "Entity fetch timed out after {} ms", timeout.as_millis())
            }
            FetchError::Failed { source } => write!(f, "Entity fetch failed: {}", source),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FetchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            FetchError::Failed { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "FETCH_TIMEOUT",
            FetchError::Failed { .. } => "FETCH_FAILED",
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Fetch(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to loading endpoint configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse a configuration document
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Failed to read a configuration file
    IoError { path: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::IoError { path, message } => {
                write!(f, "Failed to read config file '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Config(err)
    }
}
