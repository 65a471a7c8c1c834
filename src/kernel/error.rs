//! Errors raised by handlers.

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::Response;

/// Boxed error type for arbitrary handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that a handler may return instead of a response.
///
/// The dispatcher never creates or wraps these; they travel from the handler
/// that raised them to whoever called the dispatcher.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// HTTP-level failure with an explicit status.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Any other failure inside a handler.
    #[error("handler failed: {0}")]
    Failed(#[source] BoxError),
}

impl HandlerError {
    /// Build an HTTP-level error.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Status code used when the error is rendered.
    pub fn http_status(&self) -> StatusCode {
        match self {
            HandlerError::Status { status, .. } => *status,
            HandlerError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as a plain-text response.
    ///
    /// Internal failures do not leak their message to the client.
    pub fn into_response(self) -> Response {
        match self {
            HandlerError::Status { status, message } => Response::new(status, message),
            HandlerError::Failed(_) => Response::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
            ),
        }
    }
}
