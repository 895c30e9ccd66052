//! The response encoder abstraction.

use crate::EncodeError;
use bytes::Bytes;
use fnbind_core::{HandlerSignature, SignatureError};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

/// A wire format for handler results.
///
/// An encoder only returns a status and body and mutates the response
/// headers it is handed. Writing the response is left to the caller, which
/// also owns the error path.
pub trait Encoder: Send + Sync + 'static {
    /// Short name used in registration errors and logs.
    fn name(&self) -> &'static str;

    /// Encoder-specific checks on a handler's signature.
    fn validate(&self, signature: &HandlerSignature) -> Result<(), SignatureError> {
        let _ = signature;
        Ok(())
    }

    /// Encodes a handler's value, or the absence of one.
    fn encode<T: Serialize + ?Sized>(
        &self,
        value: Option<&T>,
        headers: &mut HeaderMap,
    ) -> Result<(StatusCode, Bytes), EncodeError>;
}
