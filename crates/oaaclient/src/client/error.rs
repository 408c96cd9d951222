//! Errors surfaced by [`OaaClient`](super::OaaClient).
//!
//! API failures keep the metadata the platform returns (code, message,
//! status, details) so callers can report them without re-parsing bodies.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::error::TemplateError;

/// Error body returned by the platform for a non-success status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiErrorResponse {
    /// Platform error code, `UNKNOWN` when the body carries none.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// HTTP status of the response.
    pub status_code: u16,
    /// Additional error details, often one entry per payload problem.
    pub details: Vec<Value>,
    /// Server-side timestamp of the failure.
    pub timestamp: Option<String>,
    /// Request id for support tickets.
    pub request_id: Option<String>,
}

impl fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.code, self.message, self.status_code)
    }
}

/// Errors raised by the API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client or the response was unusable, for example a success
    /// status with a body that is not JSON.
    #[error("{code}: {message}")]
    Client {
        /// Error code.
        code: String,
        /// Description of the failure.
        message: String,
        /// HTTP status, when a response was received.
        status_code: Option<u16>,
    },

    /// The platform answered with an error status.
    #[error("{0}")]
    Response(Box<ApiErrorResponse>),

    /// The platform could not be reached, or retries were exhausted.
    #[error("{code}: {message}")]
    Connection {
        /// Error code.
        code: String,
        /// Description of the transport failure.
        message: String,
        /// HTTP status of the last response, when one was received.
        status_code: Option<u16>,
    },

    /// An argument was rejected before any request was sent.
    #[error("{message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// The payload template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Reading or writing a local file failed.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl ClientError {
    pub(crate) fn client(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Client {
            code: code.into(),
            message: message.into(),
            status_code: None,
        }
    }

    pub(crate) fn connection(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Connection {
            code: "ERROR".to_owned(),
            message: message.into(),
            status_code,
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Error code as reported by the platform or assigned locally.
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::Client { code, .. } | Self::Connection { code, .. } => code,
            Self::Response(response) => &response.code,
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Template(_) => "TEMPLATE",
            Self::Io { .. } => "IO",
        }
    }

    /// Message without the error code.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Client { message, .. }
            | Self::Connection { message, .. }
            | Self::InvalidArgument { message } => message.clone(),
            Self::Response(response) => response.message.clone(),
            Self::Template(error) => error.to_string(),
            Self::Io { source } => source.to_string(),
        }
    }

    /// HTTP status associated with the error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Client { status_code, .. } | Self::Connection { status_code, .. } => *status_code,
            Self::Response(response) => Some(response.status_code),
            Self::InvalidArgument { .. } | Self::Template(_) | Self::Io { .. } => None,
        }
    }

    /// Details returned by the platform; empty for local errors.
    #[must_use]
    pub fn details(&self) -> &[Value] {
        match self {
            Self::Response(response) => &response.details,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    //! Accessor and display checks for client errors.

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn response_errors_expose_platform_metadata() {
        let error = ClientError::Response(Box::new(ApiErrorResponse {
            code: "InvalidArgument".to_owned(),
            message: "Invalid Arguments".to_owned(),
            status_code: 400,
            details: vec![json!({"reason": "bad payload"})],
            timestamp: None,
            request_id: Some("req-1".to_owned()),
        }));

        assert_eq!(error.error_code(), "InvalidArgument");
        assert_eq!(error.message(), "Invalid Arguments");
        assert_eq!(error.status_code(), Some(400));
        assert_eq!(error.details().len(), 1);
        assert_eq!(error.to_string(), "InvalidArgument: Invalid Arguments (400)");
    }

    #[rstest]
    #[case::client(ClientError::client("MISSING_URL", "URL cannot be None"), "MISSING_URL", None)]
    #[case::connection(ClientError::connection("refused", None), "ERROR", None)]
    #[case::argument(ClientError::invalid_argument("Must provide Veza URL"), "INVALID_ARGUMENT", None)]
    fn local_errors_have_codes(
        #[case] error: ClientError,
        #[case] code: &str,
        #[case] status: Option<u16>,
    ) {
        assert_eq!(error.error_code(), code);
        assert_eq!(error.status_code(), status);
        assert!(error.details().is_empty());
    }
}
