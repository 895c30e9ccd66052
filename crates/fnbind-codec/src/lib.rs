//! # fnbind Codec
//!
//! Request decoders and response encoders for fnbind.
//!
//! A decoder turns an inbound request into a handler's argument tuple; an
//! encoder turns the handler's value into a status and a body. Both are
//! pluggable per route.
//!
//! ## Provided Codecs
//!
//! | Codec | Decodes | Encodes |
//! |---|---|---|
//! | [`JsonDecoder`] / [`JsonEncoder`] | `application/json` bodies | JSON, `204` for no value |
//! | [`NoOpDecoder`] / [`NoOpEncoder`] | nothing | `204` |
//!
//! ## Decode Errors
//!
//! | Failure | Status |
//! |---|---|
//! | wrong content type | 415 |
//! | `GET` to a body-carrying route | 405 |
//! | body over the ceiling | 413 |
//! | malformed body, unknown field | 400 |

#![doc(html_root_url = "https://docs.rs/fnbind-codec/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod body;
mod decoder;
mod encoder;
mod error;
mod json;
mod noop;

pub use decoder::{DecodeGate, Decoder, RequestSource};
pub use encoder::Encoder;
pub use error::{DecodeError, EncodeError};
pub use json::{JsonDecoder, JsonEncoder, APPLICATION_JSON};
pub use noop::{NoOpDecoder, NoOpEncoder};
