//! JSON wire format.
//!
//! [`JsonDecoder`] expects `application/json` request bodies and rejects
//! unknown fields by default. [`JsonEncoder`] writes values as JSON with a
//! `200 OK` and maps "no value" to `204 No Content`.

use crate::body::DEFAULT_MAX_BODY_BYTES;
use crate::{DecodeError, DecodeGate, Decoder, EncodeError, Encoder};
use bytes::Bytes;
use fnbind_core::{HandlerSignature, SignatureError};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The JSON media type.
pub const APPLICATION_JSON: &str = "application/json";

/// Decodes JSON request bodies.
///
/// # Example
///
/// ```rust
/// use fnbind_codec::{Decoder, JsonDecoder};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Greet {
///     name: String,
/// }
///
/// let decoder = JsonDecoder::new();
/// let greet: Greet = decoder.decode_payload(br#"{"name":"Ada"}"#).unwrap();
/// assert_eq!(greet.name, "Ada");
///
/// let err = decoder
///     .decode_payload::<Greet>(br#"{"name":"Ada","age":36}"#)
///     .unwrap_err();
/// assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    max_body_bytes: usize,
    disallow_unknown_fields: bool,
}

impl JsonDecoder {
    /// Creates a decoder with a 64 KiB ceiling that rejects unknown fields.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            disallow_unknown_fields: true,
        }
    }

    /// Sets the body byte ceiling.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Sets whether fields the payload type does not declare are rejected.
    #[must_use]
    pub fn disallow_unknown_fields(mut self, disallow: bool) -> Self {
        self.disallow_unknown_fields = disallow;
        self
    }

    /// Returns `true` if unknown fields are rejected.
    #[must_use]
    pub fn rejects_unknown_fields(&self) -> bool {
        self.disallow_unknown_fields
    }
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeGate for JsonDecoder {
    fn preflight(&self, method: &Method, headers: &HeaderMap) -> Result<(), DecodeError> {
        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        if !content_type.is_some_and(|ct| ct.contains(APPLICATION_JSON)) {
            return Err(DecodeError::unsupported_media_type(
                APPLICATION_JSON,
                content_type,
            ));
        }

        if *method == Method::GET {
            return Err(DecodeError::method_not_allowed(method));
        }

        Ok(())
    }

    fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

impl Decoder for JsonDecoder {
    fn name(&self) -> &'static str {
        "json"
    }

    fn validate(&self, _signature: &HandlerSignature) -> Result<(), SignatureError> {
        Ok(())
    }

    fn decode_payload<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, DecodeError> {
        let mut de = serde_json::Deserializer::from_slice(body);
        let mut unknown = None;

        let value: T = serde_ignored::deserialize(&mut de, |path| {
            if unknown.is_none() {
                unknown = Some(path.to_string());
            }
        })
        .map_err(DecodeError::malformed)?;
        de.end().map_err(DecodeError::malformed)?;

        match unknown {
            Some(path) if self.disallow_unknown_fields => Err(DecodeError::unknown_field(path)),
            _ => Ok(value),
        }
    }
}

/// Encodes handler values as JSON.
///
/// # Example
///
/// ```rust
/// use fnbind_codec::{Encoder, JsonEncoder};
/// use http::{HeaderMap, StatusCode};
///
/// let mut headers = HeaderMap::new();
/// let (status, body) = JsonEncoder.encode(Some(&vec![1, 2, 3]), &mut headers).unwrap();
///
/// assert_eq!(status, StatusCode::OK);
/// assert_eq!(&body[..], b"[1,2,3]");
/// assert_eq!(headers["content-type"], "application/json");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(
        &self,
        value: Option<&T>,
        headers: &mut HeaderMap,
    ) -> Result<(StatusCode, Bytes), EncodeError> {
        let Some(value) = value else {
            return Ok((StatusCode::NO_CONTENT, Bytes::new()));
        };

        let body = serde_json::to_vec(value)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Ok((StatusCode::OK, Bytes::from(body)))
    }
}
