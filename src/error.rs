//! Error types for the Indigo MCP bridge
//!
//! This module provides structured error handling with machine-readable error
//! codes and production-safe logging integration. Nothing in the bridge is
//! retried: every error surfaces to the tool caller as a failed tool call.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, IndigoError>;

/// A single missing or malformed tool parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Parameter name
    pub field: String,
    /// What is wrong with it
    pub problem: String,
}

impl FieldError {
    pub fn new<F: Into<String>, P: Into<String>>(field: F, problem: P) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error types for Indigo MCP operations
#[derive(Error, Debug)]
pub enum IndigoError {
    /// One or more tool parameters are missing or malformed
    #[error("Invalid parameters: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// The host process exited nonzero; stderr is carried verbatim
    #[error("Indigo error: {stderr}")]
    HostExecution { exit_code: i32, stderr: String },

    /// The host exited successfully but stdout was not the expected document
    #[error("Failed to decode host output: {0}")]
    Decode(String),

    /// The host process did not finish within the configured bound
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The host executable could not be started
    #[error("Host unavailable: {0}")]
    HostUnavailable(String),

    /// No tool is registered under the requested name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Not found errors (resources, prompts)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(String),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violations
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structured error code for machine-readable error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Configuration errors (1200-1299)
    ConfigurationInvalid,

    // Device errors (1300-1399)
    DeviceControlFailed,

    // Data errors (1400-1499)
    ParsingFailed,
    ValidationFailed,

    // Service errors (1600-1699)
    ServiceUnavailable,
    ServiceTimeout,

    // Protocol errors (1700-1799)
    UnsupportedOperation,
    MessageMalformed,
    ResourceNotFound,

    // Internal errors (1900-1999)
    InternalError,
}

impl ErrorCode {
    /// Get numeric error code
    pub fn as_number(&self) -> u32 {
        match self {
            ErrorCode::ConfigurationInvalid => 1202,
            ErrorCode::DeviceControlFailed => 1303,
            ErrorCode::ParsingFailed => 1401,
            ErrorCode::ValidationFailed => 1403,
            ErrorCode::ServiceUnavailable => 1601,
            ErrorCode::ServiceTimeout => 1602,
            ErrorCode::UnsupportedOperation => 1702,
            ErrorCode::MessageMalformed => 1703,
            ErrorCode::ResourceNotFound => 1705,
            ErrorCode::InternalError => 1901,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self.as_number() {
            1200..=1299 => "configuration",
            1300..=1399 => "device",
            1400..=1499 => "data",
            1600..=1699 => "service",
            1700..=1799 => "protocol",
            1900..=1999 => "internal",
            _ => "unknown",
        }
    }
}

/// Error severity levels for monitoring
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Caller mistake, nothing wrong with the bridge
    Info,
    /// Host rejected or failed an operation
    Warning,
    /// Bridge or host is misbehaving
    Error,
}

impl IndigoError {
    pub fn validation<F: Into<String>, P: Into<String>>(field: F, problem: P) -> Self {
        IndigoError::Validation(vec![FieldError::new(field, problem)])
    }

    pub fn host_execution<S: Into<String>>(exit_code: i32, stderr: S) -> Self {
        IndigoError::HostExecution {
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        IndigoError::Decode(msg.into())
    }

    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        IndigoError::Timeout(msg.into())
    }

    pub fn host_unavailable<S: Into<String>>(msg: S) -> Self {
        IndigoError::HostUnavailable(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        IndigoError::NotFound(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        IndigoError::Config(msg.into())
    }

    pub fn mcp<S: Into<String>>(msg: S) -> Self {
        IndigoError::Mcp(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        IndigoError::Internal(msg.into())
    }

    /// Field errors carried by a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            IndigoError::Validation(errors) => errors,
            _ => &[],
        }
    }

    /// Map to structured error code
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            IndigoError::Validation(_) => ErrorCode::ValidationFailed,
            IndigoError::HostExecution { .. } => ErrorCode::DeviceControlFailed,
            IndigoError::Decode(_) | IndigoError::Json(_) => ErrorCode::ParsingFailed,
            IndigoError::Timeout(_) => ErrorCode::ServiceTimeout,
            IndigoError::HostUnavailable(_) | IndigoError::Io(_) => ErrorCode::ServiceUnavailable,
            IndigoError::UnknownTool(_) => ErrorCode::UnsupportedOperation,
            IndigoError::NotFound(_) => ErrorCode::ResourceNotFound,
            IndigoError::Config(_) => ErrorCode::ConfigurationInvalid,
            IndigoError::Mcp(_) => ErrorCode::MessageMalformed,
            IndigoError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Severity used when logging the error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            IndigoError::Validation(_)
            | IndigoError::UnknownTool(_)
            | IndigoError::NotFound(_)
            | IndigoError::Mcp(_) => ErrorSeverity::Info,
            IndigoError::HostExecution { .. } | IndigoError::Decode(_) | IndigoError::Json(_) => {
                ErrorSeverity::Warning
            }
            IndigoError::Timeout(_)
            | IndigoError::HostUnavailable(_)
            | IndigoError::Config(_)
            | IndigoError::Io(_)
            | IndigoError::Internal(_) => ErrorSeverity::Error,
        }
    }

    /// The bridge never retries; a failed attempt is terminal for the call
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Whether the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IndigoError::Validation(_) | IndigoError::UnknownTool(_) | IndigoError::NotFound(_)
        )
    }
}

/// Error reporting utilities
pub struct ErrorReporter;

impl ErrorReporter {
    /// Log an error with the component and operation it came from
    pub fn log_error(error: &IndigoError, component: &str, operation: &str) {
        let code = error.to_error_code();
        match error.severity() {
            ErrorSeverity::Info => tracing::info!(
                error_code = code.as_number(),
                category = code.category(),
                component,
                operation,
                "{error}"
            ),
            ErrorSeverity::Warning => warn!(
                error_code = code.as_number(),
                category = code.category(),
                component,
                operation,
                "{error}"
            ),
            ErrorSeverity::Error => error!(
                error_code = code.as_number(),
                category = code.category(),
                component,
                operation,
                "{error}"
            ),
        }
    }

    /// Format error for API responses
    pub fn format_api_error(error: &IndigoError) -> serde_json::Value {
        let code = error.to_error_code();
        let mut response = serde_json::json!({
            "error": {
                "code": code.as_number(),
                "category": code.category(),
                "message": error.to_string(),
                "retryable": error.is_retryable(),
            }
        });

        if let IndigoError::Validation(fields) = error {
            response["error"]["fields"] = serde_json::to_value(fields).unwrap_or_default();
        }

        response
    }
}
