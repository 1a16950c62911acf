//! HTTP error model
//!
//! Failures carry an optional status code, a message, and an optional
//! stack trace. How much of that reaches the client is decided once at
//! startup by the [`ErrorRenderer`]: development leaks the stack,
//! production never does.

use crate::settings::Environment;
use serde::Serialize;
use std::backtrace::Backtrace;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpError {
    /// HTTP status code; a missing status renders as 500.
    pub status: Option<u16>,
    pub message: String,
    pub stack: Option<String>,
}

impl HttpError {
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            stack: None,
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(404, "Page not Found")
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    #[must_use]
    pub const fn status_or_500(&self) -> u16 {
        match self.status {
            Some(status) => status,
            None => 500,
        }
    }

    /// Attach a stack trace captured at the call site.
    #[must_use]
    pub fn with_captured_stack(mut self) -> Self {
        self.stack = Some(Backtrace::force_capture().to_string());
        self
    }
}

/// Client-facing error body, rendered as JSON or fed into the error view.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Error-rendering strategy, selected once at startup from the
/// environment and never consulted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRenderer {
    /// Full detail: message and stack trace.
    Development,
    /// Message only, never a stack.
    Production,
}

impl ErrorRenderer {
    #[must_use]
    pub const fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::Development,
            Environment::Production => Self::Production,
        }
    }

    #[must_use]
    pub fn body(self, err: &HttpError) -> ErrorBody {
        ErrorBody {
            code: err.status_or_500(),
            message: err.message.clone(),
            stack: match self {
                Self::Development => err.stack.clone(),
                Self::Production => None,
            },
        }
    }
}
