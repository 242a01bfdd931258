//! Error types.
//!
//! Handlers and middleware return [`Error`], which is either *trusted* or
//! *opaque*:
//!
//! - [`Error::Trusted`] is raised on purpose. Its status and message are safe
//!   to show the client (`401 invalid token`, `404 user not found`).
//! - [`Error::Opaque`] is everything else, recovered panics included. The
//!   client only ever sees a bare `500`; the cause goes to the logs.
//!
//! [`ServerError`] and [`Unanswered`] are infrastructure failures surfaced by
//! the server and the router, never by handlers.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;

use http::StatusCode;
use serde::Serialize;

/// Result alias used by every handler and middleware.
pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// A handler failure, classified by whether it may be shown to the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    Trusted {
        status: StatusCode,
        message: String,
        fields: Option<serde_json::Value>,
    },
    #[error(transparent)]
    Opaque(anyhow::Error),
}

impl Error {
    /// An intentional failure that surfaces to the client as `status` + `cause`.
    pub fn trusted(cause: impl fmt::Display, status: StatusCode) -> Self {
        Self::Trusted { status, message: cause.to_string(), fields: None }
    }

    /// Wraps any unexpected failure. Its text never reaches the client.
    pub fn opaque(cause: impl Into<anyhow::Error>) -> Self {
        Self::Opaque(cause.into())
    }

    /// Attaches a structured payload to a trusted error. Opaque errors ignore it.
    pub fn with_fields(self, value: serde_json::Value) -> Self {
        match self {
            Self::Trusted { status, message, .. } => {
                Self::Trusted { status, message, fields: Some(value) }
            }
            opaque => opaque,
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted { .. })
    }

    /// The status this error translates to on the wire.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Trusted { status, .. } => *status,
            Self::Opaque(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The body sent to the client for this error.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            Self::Trusted { message, fields, .. } => ErrorResponse {
                error: message.clone(),
                fields: fields.clone(),
            },
            Self::Opaque(_) => ErrorResponse {
                error: StatusCode::INTERNAL_SERVER_ERROR
                    .canonical_reason()
                    .unwrap_or("Internal Server Error")
                    .to_owned(),
                fields: None,
            },
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::Opaque(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Opaque(e.into())
    }
}

/// JSON shape of every error response: `{"error": "...", "fields": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

/// A panic caught by the panic guard, with the stack captured at recovery.
#[derive(Debug, thiserror::Error)]
#[error("PANIC [{message}] TRACE[{trace}]")]
pub struct Panicked {
    message: String,
    trace: String,
}

impl Panicked {
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_owned()
        };
        Self { message, trace: Backtrace::force_capture().to_string() }
    }

    pub fn message(&self) -> &str { &self.message }
}

/// The chain finished without writing a response. The server drops the
/// connection instead of answering.
#[derive(Debug, thiserror::Error)]
#[error("no response written for {method} {path}")]
pub struct Unanswered {
    pub method: String,
    pub path: String,
}

/// Infrastructure failures: binding a port, accepting connections.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
