//! # fnbind Server
//!
//! Turns plain async functions into HTTP routes.
//!
//! A [`Router`] validates each handler's signature at registration, then
//! serves requests through one pipeline:
//!
//! ```text
//! middlewares -> decoder preflight -> bounded body read -> bind arguments
//!     -> invoke (panic boundary) -> encode -> response
//!                \___________ any fault ___________/
//!                             |
//!                       error handler
//! ```
//!
//! [`Server`] runs a router over HTTP/1.1 with graceful shutdown.
//!
//! ## Modules
//!
//! - [`router`]: registration and dispatch
//! - [`fallback`]: responses for unmatched requests, including SPA assets
//! - [`server`]: the TCP accept loop
//! - [`shutdown`]: the shutdown signal
//! - [`config`]: server configuration

#![doc(html_root_url = "https://docs.rs/fnbind-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
mod endpoint;
pub mod fallback;
mod invoke;
mod middleware;
pub mod router;
pub mod server;
pub mod shutdown;
mod translate;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use endpoint::RouteSpec;
pub use fallback::{AssetError, Fallback, NotFound, SpaAssets};
pub use middleware::{BoxFuture, Middleware, RequestHead};
pub use router::{RegisterError, Router, ROUTABLE_METHODS};
pub use server::{Server, ServerError};
pub use shutdown::ShutdownSignal;
pub use translate::{fault_status, ErrorHandler, JsonErrorHandler};

use bytes::Bytes;
use http_body_util::Full;

/// Type alias for the HTTP response produced by the router.
pub type HttpResponse = http::Response<Full<Bytes>>;
