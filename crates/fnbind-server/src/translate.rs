//! Error translation.
//!
//! Every failure on the request path (a middleware rejection, a decode
//! error, a handler error, a caught panic, an encode error) reaches the
//! client through one [`ErrorHandler`].

use bytes::Bytes;
use fnbind_codec::APPLICATION_JSON;
use fnbind_core::Fault;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde_json::json;

/// Renders a fault into a status, headers and a body.
///
/// Implemented for closures of the same shape, so a custom translator can
/// be a plain function.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use fnbind_core::{Fault, StatusedError};
/// use fnbind_server::{fault_status, ErrorHandler};
/// use http::{HeaderMap, StatusCode};
///
/// let plain = |fault: &dyn Fault| (fault_status(fault), HeaderMap::new(), Bytes::from(fault.to_string()));
///
/// let (status, _, body) = plain.render(&StatusedError::not_found("no such user"));
/// assert_eq!(status, StatusCode::NOT_FOUND);
/// assert_eq!(body, "no such user");
/// ```
pub trait ErrorHandler: Send + Sync + 'static {
    /// Renders `fault`.
    fn render(&self, fault: &dyn Fault) -> (StatusCode, HeaderMap, Bytes);
}

impl<F> ErrorHandler for F
where
    F: Fn(&dyn Fault) -> (StatusCode, HeaderMap, Bytes) + Send + Sync + 'static,
{
    fn render(&self, fault: &dyn Fault) -> (StatusCode, HeaderMap, Bytes) {
        self(fault)
    }
}

/// The status a fault is rendered with: its own, or 500.
#[must_use]
pub fn fault_status(fault: &dyn Fault) -> StatusCode {
    fault
        .status_code()
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// The default translator: `{"error": "<message>"}` as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorHandler;

impl ErrorHandler for JsonErrorHandler {
    fn render(&self, fault: &dyn Fault) -> (StatusCode, HeaderMap, Bytes) {
        let body = json!({ "error": fault.to_string() }).to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

        (fault_status(fault), headers, Bytes::from(body))
    }
}
