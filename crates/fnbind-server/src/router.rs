//! Route registration and request dispatch.
//!
//! Routes are keyed by exact path, then by method. Serving follows these
//! rules:
//!
//! | Request | Response |
//! |---|---|
//! | `OPTIONS` anything | empty `200` |
//! | unknown path | fallback (`404` unless configured) |
//! | known path, unregistered `GET` | fallback |
//! | known path, other unregistered method | `405` with `Allow` |
//! | registered route | middlewares, decode, invoke, encode |
//!
//! Whatever the outcome, an unread request body is drained afterwards, up
//! to [`DRAIN_LIMIT`] bytes.

use crate::endpoint::{Endpoint, Rendered, RouteSpec};
use crate::fallback::{empty, Fallback, NotFound};
use crate::middleware::{Middleware, RequestHead};
use crate::translate::{fault_status, ErrorHandler, JsonErrorHandler};
use crate::HttpResponse;
use bytes::Bytes;
use fnbind_codec::body::{drain, DRAIN_LIMIT};
use fnbind_codec::{Decoder, Encoder, JsonDecoder, JsonEncoder, NoOpDecoder};
use fnbind_core::{
    ArgList, BoxFault, Fault, Handler, HandlerSignature, RequestContext, SignatureError,
};
use fnbind_telemetry::fields;
use fnbind_telemetry::metrics::{record_request, InFlightGuard};
use http::header::ALLOW;
use http::{HeaderValue, Method, Request, StatusCode};
use http_body::Body;
use http_body_util::Full;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Methods a route can be registered for.
pub const ROUTABLE_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Errors from [`Router::register`].
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The method is not one of GET, POST, PUT, PATCH, DELETE.
    #[error("invalid http method: {0}")]
    InvalidMethod(Method),

    /// A handler is already registered for this method and path.
    #[error("route already registered: {method} {path}")]
    DuplicateRoute {
        /// The method.
        method: Method,
        /// The path.
        path: String,
    },

    /// The handler's shape was refused.
    #[error("invalid handler for {method} {path}: {source}")]
    Signature {
        /// The method.
        method: Method,
        /// The path.
        path: String,
        /// Why the shape was refused.
        #[source]
        source: SignatureError,
    },
}

/// Maps `(path, method)` pairs to handlers.
///
/// `D` and `E` are the decoder and encoder given to routes registered with
/// [`Router::register`]; [`Router::register_with`] picks codecs per route.
///
/// # Example
///
/// ```rust
/// use fnbind_core::{Payload, Reply, RequestContext, StatusedError};
/// use fnbind_server::Router;
/// use http::Method;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// struct Greet {
///     name: String,
/// }
/// impl Payload for Greet {}
///
/// #[derive(Serialize)]
/// struct Greeting {
///     greeting: String,
/// }
/// impl Reply for Greeting {}
///
/// async fn greet(_ctx: RequestContext, req: Greet) -> Result<Greeting, StatusedError> {
///     Ok(Greeting { greeting: format!("hello {}", req.name) })
/// }
///
/// let mut router = Router::new();
/// router.register(Method::POST, "/greet", greet).unwrap();
///
/// assert!(router.register(Method::POST, "/greet", greet).is_err());
/// ```
#[must_use]
pub struct Router<D = JsonDecoder, E = JsonEncoder> {
    routes: HashMap<String, HashMap<Method, Endpoint>>,
    decoder: D,
    encoder: E,
    middlewares: Vec<Arc<dyn Middleware>>,
    error_handler: Box<dyn ErrorHandler>,
    fallback: Box<dyn Fallback>,
    route_metrics: bool,
}

impl Router {
    /// Creates a router with the JSON codecs.
    pub fn new() -> Self {
        Self::with_codec(JsonDecoder::default(), JsonEncoder)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, E> Router<D, E>
where
    D: Decoder + Clone,
    E: Encoder + Clone,
{
    /// Creates a router whose default routes use `decoder` and `encoder`.
    pub fn with_codec(decoder: D, encoder: E) -> Self {
        Self {
            routes: HashMap::new(),
            decoder,
            encoder,
            middlewares: Vec::new(),
            error_handler: Box::new(JsonErrorHandler),
            fallback: Box::new(NotFound),
            route_metrics: false,
        }
    }

    /// Appends a middleware that runs before every route.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Replaces the error translator.
    pub fn with_error_handler(mut self, handler: impl ErrorHandler) -> Self {
        self.error_handler = Box::new(handler);
        self
    }

    /// Replaces what unmatched requests get.
    pub fn with_fallback(mut self, fallback: impl Fallback) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    /// Records per-route metrics and a debug line for every request.
    pub fn enable_route_metrics(mut self) -> Self {
        self.route_metrics = true;
        self
    }

    /// Registers `handler` for `method` and `path` with the router's codecs.
    ///
    /// # Errors
    ///
    /// - [`RegisterError::InvalidMethod`] for methods other than GET, POST,
    ///   PUT, PATCH and DELETE
    /// - [`RegisterError::DuplicateRoute`] if the pair is taken; the first
    ///   handler stays
    /// - [`RegisterError::Signature`] if the handler's shape is refused
    pub fn register<H, A>(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: H,
    ) -> Result<(), RegisterError>
    where
        H: Handler<A>,
        A: ArgList + Send + 'static,
    {
        let spec = RouteSpec::new(self.decoder.clone(), self.encoder.clone());
        self.register_with(method, path, handler, spec)
    }

    /// Registers `handler` with its own codecs and middlewares.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn register_with<H, A, D2, E2>(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: H,
        spec: RouteSpec<D2, E2>,
    ) -> Result<(), RegisterError>
    where
        H: Handler<A>,
        A: ArgList + Send + 'static,
        D2: Decoder,
        E2: Encoder,
    {
        let path = path.into();

        if !ROUTABLE_METHODS.contains(&method) {
            return Err(RegisterError::InvalidMethod(method));
        }

        if self
            .routes
            .get(&path)
            .is_some_and(|methods| methods.contains_key(&method))
        {
            return Err(RegisterError::DuplicateRoute { method, path });
        }

        let endpoint = Endpoint::new(&method, &path, handler, spec).map_err(|source| {
            RegisterError::Signature {
                method: method.clone(),
                path: path.clone(),
                source,
            }
        })?;

        self.routes.entry(path).or_default().insert(method, endpoint);
        Ok(())
    }

    /// Registers a `GET` handler with a [`NoOpDecoder`] and the router's
    /// encoder.
    ///
    /// `GET` requests carry no body, so the handler takes no parameters.
    /// Use [`Router::register`] to put a `GET` route on the router's own
    /// decoder instead.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`]; a handler with parameters fails with
    /// [`RegisterError::Signature`].
    pub fn get<H, A>(&mut self, path: impl Into<String>, handler: H) -> Result<(), RegisterError>
    where
        H: Handler<A>,
        A: ArgList + Send + 'static,
    {
        let spec = RouteSpec::new(NoOpDecoder, self.encoder.clone());
        self.register_with(Method::GET, path, handler, spec)
    }

    /// Registers a `POST` handler.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn post<H, A>(&mut self, path: impl Into<String>, handler: H) -> Result<(), RegisterError>
    where
        H: Handler<A>,
        A: ArgList + Send + 'static,
    {
        self.register(Method::POST, path, handler)
    }

    /// Registers a `PUT` handler.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn put<H, A>(&mut self, path: impl Into<String>, handler: H) -> Result<(), RegisterError>
    where
        H: Handler<A>,
        A: ArgList + Send + 'static,
    {
        self.register(Method::PUT, path, handler)
    }

    /// Registers a `PATCH` handler.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn patch<H, A>(&mut self, path: impl Into<String>, handler: H) -> Result<(), RegisterError>
    where
        H: Handler<A>,
        A: ArgList + Send + 'static,
    {
        self.register(Method::PATCH, path, handler)
    }

    /// Registers a `DELETE` handler.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn delete<H, A>(
        &mut self,
        path: impl Into<String>,
        handler: H,
    ) -> Result<(), RegisterError>
    where
        H: Handler<A>,
        A: ArgList + Send + 'static,
    {
        self.register(Method::DELETE, path, handler)
    }
}

impl<D, E> Router<D, E> {
    /// Number of registered `(method, path)` pairs.
    pub fn route_count(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    /// The validated signature of a registered route.
    pub fn signature(&self, method: &Method, path: &str) -> Option<&HandlerSignature> {
        self.routes
            .get(path)
            .and_then(|methods| methods.get(method))
            .map(Endpoint::signature)
    }

    /// Serves one request with a fresh [`RequestContext`].
    pub async fn serve<B>(&self, request: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes> + Unpin,
        B::Error: fmt::Display,
    {
        self.serve_with_context(request, RequestContext::new()).await
    }

    /// Serves one request with the given context.
    ///
    /// The context's token is cancelled when this future completes or is
    /// dropped.
    pub async fn serve_with_context<B>(
        &self,
        request: Request<B>,
        context: RequestContext,
    ) -> HttpResponse
    where
        B: Body<Data = Bytes> + Unpin,
        B::Error: fmt::Display,
    {
        let _cancel_on_exit = context.cancellation().clone().drop_guard();
        let _in_flight = self.route_metrics.then(InFlightGuard::new);
        let started = Instant::now();

        let (parts, mut body) = request.into_parts();
        let head = RequestHead::new(parts.method, parts.uri, parts.headers, context);

        let response = self.route(&head, &mut body).await;

        let leftover = drain(&mut body, DRAIN_LIMIT).await;
        if leftover > 0 {
            tracing::trace!(bytes = leftover, "drained unread request body");
        }

        if self.route_metrics {
            self.record(&head, &response, started);
        }

        response
    }

    async fn route<B>(&self, head: &RequestHead, body: &mut B) -> HttpResponse
    where
        B: Body<Data = Bytes> + Unpin,
        B::Error: fmt::Display,
    {
        if *head.method() == Method::OPTIONS {
            return empty(StatusCode::OK);
        }

        let Some(methods) = self.routes.get(head.path()) else {
            return self.fallback.respond(head).await;
        };

        let Some(endpoint) = methods.get(head.method()) else {
            if *head.method() == Method::GET {
                return self.fallback.respond(head).await;
            }
            return method_not_allowed(methods.keys());
        };

        let result = endpoint.dispatch(head, &self.middlewares, body).await;
        self.respond(head, result)
    }

    /// The single place a dispatched request's status is decided.
    fn respond(&self, head: &RequestHead, result: Result<Rendered, BoxFault>) -> HttpResponse {
        let fault = match result {
            Ok(rendered) => return rendered.into_response(),
            Err(fault) => fault,
        };

        let status = fault_status(&*fault);
        if status.is_server_error() {
            tracing::error!(
                { fields::REQUEST_ID } = %head.context().request_id(),
                { fields::HTTP_METHOD } = %head.method(),
                { fields::HTTP_PATH } = head.path(),
                { fields::HTTP_STATUS } = status.as_u16(),
                { fields::ERROR } = %fault,
                "request failed"
            );
        } else {
            tracing::warn!(
                { fields::REQUEST_ID } = %head.context().request_id(),
                { fields::HTTP_METHOD } = %head.method(),
                { fields::HTTP_PATH } = head.path(),
                { fields::HTTP_STATUS } = status.as_u16(),
                { fields::ERROR } = %fault,
                "request rejected"
            );
        }

        self.render_fault(&*fault)
    }

    /// Renders a fault through the router's error handler.
    pub(crate) fn render_fault(&self, fault: &dyn Fault) -> HttpResponse {
        let (status, headers, body) = self.error_handler.render(fault);
        Rendered {
            status,
            headers,
            body,
        }
        .into_response()
    }

    fn record(&self, head: &RequestHead, response: &HttpResponse, started: Instant) {
        let elapsed = started.elapsed();
        let bytes = response.body().size_hint().exact().unwrap_or(0);
        let path = if self.routes.contains_key(head.path()) {
            head.path()
        } else {
            "unmatched"
        };

        record_request(
            head.method().as_str(),
            path,
            response.status().as_u16(),
            elapsed,
            usize::try_from(bytes).unwrap_or(usize::MAX),
        );

        tracing::debug!(
            { fields::REQUEST_ID } = %head.context().request_id(),
            { fields::HTTP_METHOD } = %head.method(),
            { fields::HTTP_PATH } = head.path(),
            { fields::HTTP_STATUS } = response.status().as_u16(),
            { fields::RESPONSE_BYTES } = bytes,
            { fields::DURATION_MS } = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "request served"
        );
    }
}

impl<D, E> fmt::Debug for Router<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.route_count())
            .field("middlewares", &self.middlewares.len())
            .field("route_metrics", &self.route_metrics)
            .finish_non_exhaustive()
    }
}

fn method_not_allowed<'a>(allowed: impl Iterator<Item = &'a Method>) -> HttpResponse {
    let mut allowed: Vec<&str> = allowed.map(Method::as_str).collect();
    allowed.sort_unstable();

    let mut response = empty(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::BoxFuture;
    use fnbind_codec::{NoOpEncoder, APPLICATION_JSON};
    use fnbind_core::{HeaderBag, Payload, Reply, StatusedError};
    use http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};

    #[derive(Deserialize)]
    struct Greet {
        name: String,
    }

    impl Payload for Greet {}

    #[derive(Serialize)]
    struct Greeting {
        greeting: String,
    }

    impl Reply for Greeting {}

    async fn greet(_ctx: RequestContext, req: Greet) -> Result<Greeting, StatusedError> {
        if req.name.is_empty() {
            return Err(StatusedError::bad_request("name is required"));
        }
        Ok(Greeting {
            greeting: format!("hello {}", req.name),
        })
    }

    async fn whoami(headers: HeaderBag) -> String {
        headers.get("x-user").unwrap_or("anonymous").to_string()
    }

    async fn forget(_ctx: RequestContext) -> Result<(), StatusedError> {
        Ok(())
    }

    async fn crash() -> String {
        panic!("handler bug")
    }

    fn json_request(method: Method, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    fn bare_request(method: Method, uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn greet_router() -> Router {
        let mut router = Router::new();
        router.post("/greet", greet).unwrap();
        router
    }

    #[tokio::test]
    async fn test_greet_success() {
        let router = greet_router();
        let response = router
            .serve(json_request(Method::POST, "/greet", r#"{"name":"ada"}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(body_json(response).await, json!({"greeting": "hello ada"}));
    }

    #[tokio::test]
    async fn test_handler_error_is_translated() {
        let router = greet_router();
        let response = router
            .serve(json_request(Method::POST, "/greet", r#"{"name":""}"#))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "name is required"}));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let router = greet_router();
        let response = router.serve(bare_request(Method::POST, "/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_allowed() {
        let router = greet_router();
        let response = router.serve(bare_request(Method::PUT, "/greet")).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_unregistered_get_goes_to_fallback() {
        let router = greet_router();
        let response = router.serve(bare_request(Method::GET, "/greet")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_options_is_empty_ok() {
        let router = greet_router();
        for uri in ["/greet", "/anything"] {
            let response = router.serve(bare_request(Method::OPTIONS, uri)).await;
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            assert!(bytes.is_empty());
        }
    }

    #[tokio::test]
    async fn test_no_value_is_no_content() {
        let mut router = Router::new();
        router
            .register_with(
                Method::DELETE,
                "/session",
                forget,
                RouteSpec::new(NoOpDecoder, NoOpEncoder),
            )
            .unwrap();

        let response = router.serve(bare_request(Method::DELETE, "/session")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_header_bag_route() {
        let mut router = Router::new();
        router
            .register_with(
                Method::GET,
                "/whoami",
                whoami,
                RouteSpec::new(NoOpDecoder, JsonEncoder),
            )
            .unwrap_err();

        // NoOpDecoder refuses parameters; a JSON route binds headers without a body.
        router.post("/whoami", whoami).unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/whoami")
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header("X-User", "grace")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = router.serve(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!("grace"));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let mut router = Router::new();
        router
            .register_with(
                Method::GET,
                "/crash",
                crash,
                RouteSpec::new(NoOpDecoder, JsonEncoder),
            )
            .unwrap();

        let response = router.serve(bare_request(Method::GET, "/crash")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "panic in route execution: handler bug"})
        );
    }

    #[test]
    fn test_invalid_method() {
        let mut router = Router::new();
        let err = router
            .register(Method::OPTIONS, "/greet", greet)
            .unwrap_err();
        assert!(matches!(&err, RegisterError::InvalidMethod(m) if *m == Method::OPTIONS));
        assert_eq!(err.to_string(), "invalid http method: OPTIONS");
        assert_eq!(router.route_count(), 0);
    }

    #[test]
    fn test_duplicate_route_keeps_first() {
        let mut router = greet_router();
        let err = router.post("/greet", whoami).unwrap_err();

        assert!(matches!(err, RegisterError::DuplicateRoute { .. }));
        assert_eq!(router.route_count(), 1);
        let kept = router.signature(&Method::POST, "/greet").unwrap();
        assert!(kept.has_payload());
    }

    #[test]
    fn test_same_path_other_method() {
        let mut router = greet_router();
        router.put("/greet", greet).unwrap();
        assert_eq!(router.route_count(), 2);
    }

    #[test]
    fn test_signature_error() {
        async fn two_payloads(_a: Greet, _b: Greet) {}

        let mut router = Router::new();
        let err = router.post("/twice", two_payloads).unwrap_err();
        match err {
            RegisterError::Signature { source, .. } => {
                assert!(matches!(source, SignatureError::DuplicateRole { .. }));
            }
            other => panic!("expected signature error, got {other}"),
        }
        assert!(router.signature(&Method::POST, "/twice").is_none());
    }

    struct RequireUser;

    impl Middleware for RequireUser {
        fn name(&self) -> &'static str {
            "require-user"
        }

        fn before<'a>(&'a self, head: &'a RequestHead) -> BoxFuture<'a, Result<(), BoxFault>> {
            let allowed = head.headers().contains_key("x-user");
            Box::pin(async move {
                if allowed {
                    Ok(())
                } else {
                    Err(Box::new(StatusedError::new(StatusCode::UNAUTHORIZED, "who are you")) as BoxFault)
                }
            })
        }
    }

    #[tokio::test]
    async fn test_router_middleware_rejects() {
        let router = greet_router().middleware(RequireUser);
        let response = router
            .serve(json_request(Method::POST, "/greet", r#"{"name":"ada"}"#))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"error": "who are you"}));
    }

    #[tokio::test]
    async fn test_route_middleware_is_scoped() {
        let mut router = Router::new();
        router
            .register_with(
                Method::POST,
                "/private",
                greet,
                RouteSpec::new(JsonDecoder::new(), JsonEncoder).middleware(RequireUser),
            )
            .unwrap();
        router.post("/public", greet).unwrap();

        let private = router
            .serve(json_request(Method::POST, "/private", r#"{"name":"ada"}"#))
            .await;
        let public = router
            .serve(json_request(Method::POST, "/public", r#"{"name":"ada"}"#))
            .await;

        assert_eq!(private.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(public.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_custom_error_handler() {
        let router = greet_router().with_error_handler(|fault: &dyn Fault| {
            (
                fault_status(fault),
                http::HeaderMap::new(),
                Bytes::from(format!("oops: {fault}")),
            )
        });

        let response = router
            .serve(json_request(Method::POST, "/greet", "not json"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"oops: "));
    }

    #[tokio::test]
    async fn test_context_cancelled_after_serve() {
        let router = greet_router();
        let context = RequestContext::new();
        let token = context.cancellation().clone();

        let response = router
            .serve_with_context(json_request(Method::POST, "/greet", r#"{"name":"ada"}"#), context)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_route_metrics_enabled() {
        let router = greet_router().enable_route_metrics();
        let response = router.serve(bare_request(Method::GET, "/elsewhere")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn profile(_ctx: RequestContext, headers: HeaderBag, req: Greet) -> Value {
        json!({
            "user": headers.get("X-User"),
            "keys": headers.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            "name": req.name,
        })
    }

    async fn tagged(headers: HeaderBag, req: Greet) -> String {
        format!("{}:{}", headers.get("X-User").unwrap_or("-"), req.name)
    }

    fn profile_request(uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header("x-user", "grace")
            .body(Full::new(Bytes::from_static(br#"{"name":"ada"}"#)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_context_headers_and_payload() {
        let mut router = Router::new();
        router.post("/profile", profile).unwrap();

        let response = router.serve(profile_request("/profile")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["user"], "grace");
        assert_eq!(body["name"], "ada");
        let keys = body["keys"].as_array().unwrap();
        assert!(keys.contains(&json!("X-User")));
        assert!(!keys.contains(&json!("x-user")));
    }

    #[tokio::test]
    async fn test_headers_then_payload() {
        let mut router = Router::new();
        router.post("/tagged", tagged).unwrap();

        let response = router.serve(profile_request("/tagged")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!("grace:ada"));
    }

    #[tokio::test]
    async fn test_get_serves_parameterless_handler() {
        async fn version() -> &'static str {
            "1.0"
        }

        let mut router = Router::new();
        router.get("/version", version).unwrap();

        let response = router.serve(bare_request(Method::GET, "/version")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!("1.0"));
    }

    #[test]
    fn test_get_rejects_handler_with_parameters() {
        let mut router = Router::new();
        let err = router.get("/whoami", whoami).unwrap_err();
        assert!(matches!(err, RegisterError::Signature { .. }));
        assert!(router.signature(&Method::GET, "/whoami").is_none());
    }

    #[tokio::test]
    async fn test_get_on_json_route_is_prohibited() {
        let mut router = Router::new();
        router.register(Method::GET, "/whoami", whoami).unwrap();

        let response = router.serve(json_request(Method::GET, "/whoami", "")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await,
            json!({"error": "GET requests prohibited for this endpoint"})
        );
    }

    #[derive(Clone, Default)]
    struct FieldNames(Arc<std::sync::Mutex<Vec<&'static str>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FieldNames {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut names = self.0.lock().unwrap();
            names.extend(event.metadata().fields().iter().map(|f| f.name()));
        }
    }

    #[tokio::test]
    async fn test_request_logs_use_standard_fields() {
        use tracing_subscriber::layer::SubscriberExt;

        let names = FieldNames::default();
        let subscriber = tracing_subscriber::registry().with(names.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let router = greet_router().enable_route_metrics();
        let response = router
            .serve(json_request(Method::POST, "/greet", r#"{"name":""}"#))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let names = names.0.lock().unwrap();
        for field in [
            fields::REQUEST_ID,
            fields::HTTP_METHOD,
            fields::HTTP_PATH,
            fields::HTTP_STATUS,
            fields::RESPONSE_BYTES,
            fields::DURATION_MS,
            fields::ERROR,
        ] {
            assert!(names.contains(&field), "missing {field} in {names:?}");
        }
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let methods = [Method::PUT, Method::DELETE, Method::POST];
        let response = method_not_allowed(methods.iter());
        assert_eq!(response.headers()[ALLOW], "DELETE, POST, PUT");
    }
}
