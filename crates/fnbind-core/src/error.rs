//! Error types shared by every stage of the dispatch pipeline.
//!
//! Two concepts live here:
//!
//! - [`Fault`] is the capability a handler's error type opts into. Anything
//!   implementing it can sit in the error slot of a handler's return type and
//!   reach the error translator. A fault may carry an explicit HTTP status; if
//!   it does not, it is rendered as `500 Internal Server Error`.
//! - [`StatusedError`] is the ready-made fault carrying an explicit status.
//!
//! | Fault | Status |
//! |---|---|
//! | [`StatusedError`] | its own status |
//! | `anyhow::Error` wrapping a [`StatusedError`] | the wrapped status |
//! | `anyhow::Error`, `std::io::Error`, boxed errors | 500 |

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// A boxed, type-erased fault.
pub type BoxFault = Box<dyn Fault>;

/// An error that can be returned from a handler and rendered as a response.
///
/// Implement it for your own error types; override [`Fault::status_code`] to
/// pick the response status.
///
/// # Example
///
/// ```
/// use fnbind_core::Fault;
/// use http::StatusCode;
///
/// #[derive(Debug, thiserror::Error)]
/// enum AccountError {
///     #[error("account {0} not found")]
///     Missing(String),
///     #[error("storage unavailable")]
///     Storage,
/// }
///
/// impl Fault for AccountError {
///     fn status_code(&self) -> Option<StatusCode> {
///         match self {
///             Self::Missing(_) => Some(StatusCode::NOT_FOUND),
///             Self::Storage => None,
///         }
///     }
/// }
///
/// assert_eq!(
///     AccountError::Missing("a-1".into()).status_code(),
///     Some(StatusCode::NOT_FOUND)
/// );
/// ```
pub trait Fault: fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// The explicit status this fault carries, if any.
    fn status_code(&self) -> Option<StatusCode> {
        None
    }
}

/// An error carrying an explicit HTTP status code.
///
/// # Example
///
/// ```
/// use fnbind_core::{Fault, StatusedError};
/// use http::StatusCode;
///
/// let err = StatusedError::new(StatusCode::CONFLICT, "name already taken");
/// assert_eq!(err.status_code(), Some(StatusCode::CONFLICT));
/// assert_eq!(err.to_string(), "name already taken");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StatusedError {
    status: StatusCode,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

impl StatusedError {
    /// Creates an error with the given status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error with an underlying cause.
    pub fn with_source(
        status: StatusCode,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a `400 Bad Request` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a `404 Not Found` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a `500 Internal Server Error` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Fault for StatusedError {
    fn status_code(&self) -> Option<StatusCode> {
        Some(self.status)
    }
}

impl Fault for anyhow::Error {
    fn status_code(&self) -> Option<StatusCode> {
        self.downcast_ref::<StatusedError>().map(StatusedError::status)
    }
}

impl Fault for Box<dyn std::error::Error + Send + Sync> {
    fn status_code(&self) -> Option<StatusCode> {
        self.downcast_ref::<StatusedError>().map(StatusedError::status)
    }
}

impl Fault for std::io::Error {}

impl Fault for std::convert::Infallible {}

impl Fault for BoxFault {
    fn status_code(&self) -> Option<StatusCode> {
        (**self).status_code()
    }
}
