//! Decode and encode error types.
//!
//! Every decode failure maps to a distinct HTTP status so clients can tell
//! a wrong content type from an oversized or malformed body.

use fnbind_core::Fault;
use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Error that occurs while turning a request into handler arguments.
///
/// # Example
///
/// ```rust
/// use fnbind_codec::DecodeError;
/// use http::StatusCode;
///
/// let err = DecodeError::payload_too_large(65536);
/// assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
/// assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
/// assert!(err.to_string().contains("65536"));
/// ```
#[derive(Debug)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeErrorKind {
    /// Content type does not match the decoder's wire format
    UnsupportedMediaType,
    /// Method carries no body for this decoder
    MethodNotAllowed,
    /// Body exceeded the byte ceiling
    PayloadTooLarge,
    /// Body is not valid for the payload type
    MalformedPayload,
    /// Body has a field the payload type does not declare
    UnknownField,
    /// The transport failed while the body was read
    BodyRead,
    /// A parameter had no way to be bound
    Unbindable,
}

impl DecodeError {
    /// Creates an error for a content type the decoder does not accept.
    #[must_use]
    pub fn unsupported_media_type(expected: &str, actual: Option<&str>) -> Self {
        let actual = actual.unwrap_or("none");
        Self {
            kind: DecodeErrorKind::UnsupportedMediaType,
            message: format!("invalid mime type: expected '{expected}', got '{actual}'"),
        }
    }

    /// Creates an error for a method the decoder refuses.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method) -> Self {
        Self {
            kind: DecodeErrorKind::MethodNotAllowed,
            message: format!("{method} requests prohibited for this endpoint"),
        }
    }

    /// Creates an error for a body larger than `limit` bytes.
    #[must_use]
    pub fn payload_too_large(limit: usize) -> Self {
        Self {
            kind: DecodeErrorKind::PayloadTooLarge,
            message: format!("maximum body size exceeded ({limit} bytes)"),
        }
    }

    /// Creates an error for a body that does not parse as the payload type.
    #[must_use]
    pub fn malformed(details: impl fmt::Display) -> Self {
        Self {
            kind: DecodeErrorKind::MalformedPayload,
            message: format!("malformed payload: {details}"),
        }
    }

    /// Creates an error for an undeclared field.
    #[must_use]
    pub fn unknown_field(path: impl fmt::Display) -> Self {
        Self {
            kind: DecodeErrorKind::UnknownField,
            message: format!("unknown field \"{path}\""),
        }
    }

    /// Creates an error for a transport failure while reading the body.
    #[must_use]
    pub fn body_read(details: impl fmt::Display) -> Self {
        Self {
            kind: DecodeErrorKind::BodyRead,
            message: format!("failed to read request body: {details}"),
        }
    }

    /// Creates an error for a parameter type with no binding rule.
    #[must_use]
    pub fn unbindable(type_name: &str) -> Self {
        Self {
            kind: DecodeErrorKind::Unbindable,
            message: format!("no binding for parameter of type {type_name}"),
        }
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            DecodeErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DecodeErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            DecodeErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DecodeErrorKind::MalformedPayload
            | DecodeErrorKind::UnknownField
            | DecodeErrorKind::BodyRead => StatusCode::BAD_REQUEST,
            DecodeErrorKind::Unbindable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            DecodeErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            DecodeErrorKind::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            DecodeErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            DecodeErrorKind::MalformedPayload => "MALFORMED_PAYLOAD",
            DecodeErrorKind::UnknownField => "UNKNOWN_FIELD",
            DecodeErrorKind::BodyRead => "BODY_READ_FAILED",
            DecodeErrorKind::Unbindable => "UNBINDABLE_PARAMETER",
        }
    }

    /// Returns the message without the status.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DecodeError {}

impl Fault for DecodeError {
    fn status_code(&self) -> Option<StatusCode> {
        Some(Self::status_code(self))
    }
}

/// Error that occurs while encoding a handler's value.
///
/// Always rendered as `500 Internal Server Error`.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value could not be serialized.
    #[error("failed to encode response: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The encoder does not produce a body for values.
    #[error("{encoder} cannot encode a value")]
    UnexpectedValue {
        /// Encoder name.
        encoder: &'static str,
    },
}

impl Fault for EncodeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_unsupported_media_type() {
        let err = DecodeError::unsupported_media_type("application/json", Some("text/plain"));
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.error_code(), "UNSUPPORTED_MEDIA_TYPE");
        assert!(err.to_string().contains("text/plain"));

        let err = DecodeError::unsupported_media_type("application/json", None);
        assert!(err.to_string().contains("'none'"));
    }

    #[test]
    fn test_method_not_allowed() {
        let err = DecodeError::method_not_allowed(&Method::GET);
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "GET requests prohibited for this endpoint");
    }

    #[test]
    fn test_body_errors_are_bad_request() {
        for err in [
            DecodeError::malformed("expected value at line 1 column 1"),
            DecodeError::unknown_field("nickname"),
            DecodeError::body_read("connection reset"),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{err}");
        }
    }

    #[test]
    fn test_unknown_field_message() {
        let err = DecodeError::unknown_field("nickname");
        assert_eq!(err.message(), "unknown field \"nickname\"");
        assert_eq!(err.error_code(), "UNKNOWN_FIELD");
    }

    #[test]
    fn test_fault_carries_status() {
        let err = DecodeError::payload_too_large(10);
        assert_eq!(Fault::status_code(&err), Some(StatusCode::PAYLOAD_TOO_LARGE));

        let err = DecodeError::unbindable("String");
        assert_eq!(
            Fault::status_code(&err),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn test_encode_error_has_no_status() {
        let err = EncodeError::UnexpectedValue { encoder: "noop" };
        assert_eq!(Fault::status_code(&err), None);
        assert_eq!(err.to_string(), "noop cannot encode a value");
    }
}
