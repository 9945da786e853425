use serde_json::json;
use std::fmt;
use thiserror::Error;

pub const SCIM_ERROR_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// Malformed filter text, reported with the byte offset where it was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
    /// What the parser would have accepted at `offset`, when known
    pub expected: Option<String>,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
            expected: None,
        }
    }

    pub fn expected(offset: usize, expected: impl Into<String>, found: &str) -> Self {
        let expected = expected.into();
        Self {
            offset,
            message: format!("expected {}, found {}", expected, found),
            expected: Some(expected),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] SyntaxError),
    #[error("Resource store error: {0}")]
    Store(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

// SCIM 2.0 standard error response helper
pub fn scim_error_response(status: u16, scim_type: Option<&str>, detail: &str) -> serde_json::Value {
    let mut body = json!({
        "schemas": [SCIM_ERROR_SCHEMA],
        "detail": detail,
        "status": status.to_string(),
    });
    if let Some(scim_type) = scim_type {
        body["scimType"] = json!(scim_type);
    }
    body
}

impl AppError {
    /// HTTP status a transport layer should answer with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidFilter(_) => 400,
            _ => 500,
        }
    }

    pub fn to_scim_error(&self) -> (u16, serde_json::Value) {
        let status = self.status_code();
        match self {
            AppError::InvalidFilter(e) => (
                status,
                scim_error_response(status, Some("invalidFilter"), &e.to_string()),
            ),
            other => {
                tracing::error!("{}", other);
                (
                    status,
                    scim_error_response(status, None, "Internal server error"),
                )
            }
        }
    }
}
