//! # fnbind
//!
//! Turns ordinary typed async functions into HTTP handlers.
//!
//! A handler's parameters and return type are inspected once, when it is
//! registered. Illegal shapes are rejected there. At request time the
//! router decodes the body into the handler's payload parameter, calls it
//! behind a panic boundary and encodes the result.
//!
//! ## Handler shapes
//!
//! Parameters, in order, each at most once:
//!
//! | Parameter | Role |
//! |-----------|------|
//! | [`RequestContext`](prelude::RequestContext) | cancellation and request ID, must come first |
//! | [`HeaderBag`](prelude::HeaderBag) | request headers |
//! | a [`Payload`](prelude::Payload) type | the decoded body, must come last |
//!
//! Returns: nothing, a [`Reply`](prelude::Reply) value, a
//! [`Fault`](prelude::Fault), or `Result<Reply, Fault>`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fnbind::prelude::*;
//!
//! #[derive(Deserialize)]
//! struct Greet { name: String }
//! impl Payload for Greet {}
//!
//! #[derive(Serialize)]
//! struct Greeting { greeting: String }
//! impl Reply for Greeting {}
//!
//! async fn greet(_ctx: RequestContext, req: Greet) -> Result<Greeting, StatusedError> {
//!     Ok(Greeting { greeting: format!("hello {}", req.name) })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fnbind::Error> {
//!     let config = ConfigLoader::new().with_env_prefix("FNBIND").load()?;
//!     fnbind::init_telemetry(&config)?;
//!
//!     let mut router = fnbind::router(&config);
//!     router.post("/greet", greet)?;
//!
//!     fnbind::serve(&config, router).await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/fnbind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;

pub use bootstrap::{init_telemetry, router, serve, serve_with_shutdown};

// Re-export core types
pub use fnbind_core as core;

// Re-export codecs
pub use fnbind_codec as codec;

// Re-export server types
pub use fnbind_server as server;

// Re-export telemetry
pub use fnbind_telemetry as telemetry;

// Re-export configuration
pub use fnbind_config as config;

use thiserror::Error as ThisError;

/// Errors from bootstrapping and running a service.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] fnbind_config::ConfigError),

    /// A handler was rejected at registration.
    #[error(transparent)]
    Register(#[from] fnbind_server::RegisterError),

    /// Logging or metrics could not be initialised.
    #[error(transparent)]
    Telemetry(#[from] fnbind_telemetry::TelemetryError),

    /// The server could not start.
    #[error(transparent)]
    Server(#[from] fnbind_server::ServerError),
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use fnbind::prelude::*;
/// ```
pub mod prelude {
    pub use fnbind_core::{
        BoxFault, Fault, HeaderBag, Payload, Reply, RequestContext, RequestId, StatusedError,
    };

    pub use fnbind_codec::{JsonDecoder, JsonEncoder, NoOpDecoder, NoOpEncoder};

    pub use fnbind_server::{
        Middleware, RequestHead, RouteSpec, Router, Server, ServerConfig, ShutdownSignal,
        SpaAssets,
    };

    pub use fnbind_config::{ConfigLoader, FnbindConfig};
}
