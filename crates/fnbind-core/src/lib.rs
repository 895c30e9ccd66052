//! # fnbind Core
//!
//! Core types for the fnbind dispatch engine.
//!
//! This crate describes handlers and the values they exchange with a request.
//! It knows nothing about HTTP bodies or wire formats; codecs and the router
//! live in `fnbind-codec` and `fnbind-server`.
//!
//! ## Key Types
//!
//! - [`HandlerSignature`]: classified parameter and return roles of a handler
//! - [`Handler`]: implemented for async functions usable as routes
//! - [`Arg`], [`Payload`]: parameter types and how they bind
//! - [`Outcome`], [`Reply`]: return types and how they split
//! - [`Fault`], [`StatusedError`]: errors that reach the error translator
//! - [`RequestContext`], [`HeaderBag`]: the context and header-bag roles
//!
//! ## Example
//!
//! ```
//! use fnbind_core::{Handler, Payload, Reply, RequestContext, StatusedError};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct Greet {
//!     name: String,
//! }
//! impl Payload for Greet {}
//!
//! #[derive(Serialize)]
//! struct Greeting {
//!     message: String,
//! }
//! impl Reply for Greeting {}
//!
//! async fn greet(_ctx: RequestContext, body: Greet) -> Result<Greeting, StatusedError> {
//!     if body.name.is_empty() {
//!         return Err(StatusedError::bad_request("name is required"));
//!     }
//!     Ok(Greeting { message: format!("hello {}", body.name) })
//! }
//!
//! fn check<H: Handler<A>, A>(_: H) -> bool {
//!     H::signature().validate().is_ok()
//! }
//!
//! assert!(check(greet));
//! ```

#![doc(html_root_url = "https://docs.rs/fnbind-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod arg;
mod context;
mod error;
mod handler;
pub mod header;
mod outcome;
pub mod signature;

pub use arg::{Arg, ArgList, BindSource, Payload};
pub use context::{RequestContext, RequestId};
pub use error::{BoxFault, Fault, StatusedError};
pub use handler::Handler;
pub use header::HeaderBag;
pub use outcome::{Outcome, Reply};
pub use signature::{
    classify, HandlerSignature, ParamDescriptor, ReturnRole, Role, SignatureError, TypeShape,
};
