//! Pre-dispatch hooks.
//!
//! A middleware sees the request head before the body is read or the
//! handler runs. Returning a fault stops the request; the fault is rendered
//! by the router's error handler like any other.
//!
//! # Example
//!
//! ```rust
//! use fnbind_core::{BoxFault, StatusedError};
//! use fnbind_server::{BoxFuture, Middleware, RequestHead};
//! use http::StatusCode;
//!
//! struct RequireApiKey;
//!
//! impl Middleware for RequireApiKey {
//!     fn name(&self) -> &'static str {
//!         "require-api-key"
//!     }
//!
//!     fn before<'a>(&'a self, head: &'a RequestHead) -> BoxFuture<'a, Result<(), BoxFault>> {
//!         Box::pin(async move {
//!             if head.headers().contains_key("x-api-key") {
//!                 Ok(())
//!             } else {
//!                 Err(Box::new(StatusedError::new(StatusCode::UNAUTHORIZED, "missing api key")) as BoxFault)
//!             }
//!         })
//!     }
//! }
//! ```

use fnbind_core::{BoxFault, RequestContext};
use fnbind_telemetry::fields;
use http::{HeaderMap, Method, Uri};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The parts of a request available before its body is read.
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    context: RequestContext,
}

impl RequestHead {
    /// Creates a request head.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, context: RequestContext) -> Self {
        Self {
            method,
            uri,
            headers,
            context,
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The URI path, used as the routing key.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The per-request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

/// A hook that runs before a route's handler.
///
/// Middlewares run in registration order: router-wide ones first, then the
/// route's own. The first fault stops the chain.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Inspects the request, returning a fault to reject it.
    fn before<'a>(&'a self, head: &'a RequestHead) -> BoxFuture<'a, Result<(), BoxFault>>;
}

/// Runs `middlewares` in order, stopping at the first fault.
pub(crate) async fn run_before<'a, I>(middlewares: I, head: &RequestHead) -> Result<(), BoxFault>
where
    I: IntoIterator<Item = &'a Arc<dyn Middleware>>,
{
    for middleware in middlewares {
        if let Err(fault) = middleware.before(head).await {
            tracing::debug!(
                middleware = middleware.name(),
                { fields::ERROR } = %fault,
                "request rejected by middleware"
            );
            return Err(fault);
        }
    }
    Ok(())
}
