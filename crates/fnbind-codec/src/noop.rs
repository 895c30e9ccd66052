//! Codecs for handlers that take no input or produce no output.

use crate::{DecodeError, DecodeGate, Decoder, EncodeError, Encoder};
use bytes::Bytes;
use fnbind_core::{HandlerSignature, SignatureError};
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decoder for handlers without parameters.
///
/// Accepts any method and content type and never reads the body. This is
/// the decoder to pair with `GET` routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDecoder;

impl DecodeGate for NoOpDecoder {
    fn preflight(&self, _method: &Method, _headers: &HeaderMap) -> Result<(), DecodeError> {
        Ok(())
    }

    fn max_body_bytes(&self) -> usize {
        0
    }
}

impl Decoder for NoOpDecoder {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn validate(&self, signature: &HandlerSignature) -> Result<(), SignatureError> {
        if signature.arity() == 0 {
            Ok(())
        } else {
            Err(SignatureError::codec(
                self.name(),
                "only works for handlers with no parameters",
            ))
        }
    }

    fn decode_payload<T: DeserializeOwned>(&self, _body: &[u8]) -> Result<T, DecodeError> {
        Err(DecodeError::unbindable(std::any::type_name::<T>()))
    }
}

/// Encoder for handlers without a return value.
///
/// Always answers `204 No Content`. Handlers may still return an error,
/// which is rendered by the error translator as usual.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEncoder;

impl Encoder for NoOpEncoder {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn validate(&self, signature: &HandlerSignature) -> Result<(), SignatureError> {
        if signature.returns_value() {
            Err(SignatureError::codec(
                self.name(),
                "only works for handlers with no return value",
            ))
        } else {
            Ok(())
        }
    }

    fn encode<T: Serialize + ?Sized>(
        &self,
        value: Option<&T>,
        _headers: &mut HeaderMap,
    ) -> Result<(StatusCode, Bytes), EncodeError> {
        match value {
            None => Ok((StatusCode::NO_CONTENT, Bytes::new())),
            Some(_) => Err(EncodeError::UnexpectedValue {
                encoder: self.name(),
            }),
        }
    }
}
