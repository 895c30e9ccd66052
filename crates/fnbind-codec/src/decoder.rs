//! The request decoder abstraction.
//!
//! Decoding is split in two so the router can run the cheap checks and read
//! the body without knowing the handler's argument types:
//!
//! - [`DecodeGate`] is object safe. It checks the method and headers before
//!   any body byte is read and reports the body ceiling.
//! - [`Decoder`] adds signature validation and typed payload decoding.
//!
//! [`Decoder::decode`] binds a whole argument tuple by handing the handler's
//! [`ArgList`] a [`RequestSource`].

use crate::DecodeError;
use bytes::Bytes;
use fnbind_core::{ArgList, BindSource, HandlerSignature, HeaderBag, RequestContext, SignatureError};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

/// Checks a request can be decoded before its body is touched.
pub trait DecodeGate: Send + Sync + 'static {
    /// Rejects requests whose method or content type this decoder refuses.
    fn preflight(&self, method: &Method, headers: &HeaderMap) -> Result<(), DecodeError>;

    /// Byte ceiling for the request body.
    fn max_body_bytes(&self) -> usize;
}

/// A wire format for request payloads.
pub trait Decoder: DecodeGate {
    /// Short name used in registration errors and logs.
    fn name(&self) -> &'static str;

    /// Decoder-specific checks on a handler's signature.
    ///
    /// Runs after the role rules have passed.
    fn validate(&self, signature: &HandlerSignature) -> Result<(), SignatureError>;

    /// Deserializes a body into the payload type.
    fn decode_payload<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, DecodeError>;

    /// Binds every handler argument from the request.
    ///
    /// `body` is `None` when the signature has no payload role.
    fn decode<A: ArgList>(
        &self,
        context: &RequestContext,
        headers: &HeaderMap,
        body: Option<&Bytes>,
    ) -> Result<A, DecodeError>
    where
        Self: Sized,
    {
        A::bind(&RequestSource {
            decoder: self,
            context,
            headers,
            body,
        })
    }
}

/// A request seen through a decoder.
#[derive(Debug)]
pub struct RequestSource<'a, D> {
    decoder: &'a D,
    context: &'a RequestContext,
    headers: &'a HeaderMap,
    body: Option<&'a Bytes>,
}

impl<'a, D: Decoder> RequestSource<'a, D> {
    /// Creates a source over one request.
    #[must_use]
    pub fn new(
        decoder: &'a D,
        context: &'a RequestContext,
        headers: &'a HeaderMap,
        body: Option<&'a Bytes>,
    ) -> Self {
        Self {
            decoder,
            context,
            headers,
            body,
        }
    }
}

impl<D: Decoder> BindSource for RequestSource<'_, D> {
    type Error = DecodeError;

    fn context(&self) -> RequestContext {
        self.context.clone()
    }

    fn header_bag(&self) -> HeaderBag {
        HeaderBag::from_headers(self.headers)
    }

    fn payload<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        match self.body {
            Some(body) => self.decoder.decode_payload(body),
            None => Err(DecodeError::unbindable(std::any::type_name::<T>())),
        }
    }

    fn unbindable(&self, type_name: &'static str) -> DecodeError {
        DecodeError::unbindable(type_name)
    }
}
