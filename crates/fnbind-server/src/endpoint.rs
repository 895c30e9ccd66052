//! A registered route: a validated handler with its codecs.
//!
//! The handler's argument and output types are erased at registration.
//! What stays typed is captured in one closure that decodes the arguments,
//! invokes the handler and encodes the value.

use crate::invoke::invoke;
use crate::middleware::{run_before, BoxFuture, Middleware, RequestHead};
use crate::HttpResponse;
use bytes::Bytes;
use fnbind_codec::body::read_bounded;
use fnbind_codec::{DecodeGate, Decoder, Encoder};
use fnbind_core::{ArgList, BoxFault, Fault, Handler, HandlerSignature, SignatureError};
use fnbind_telemetry::fields;
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, Method, StatusCode};
use http_body::Body;
use http_body_util::Full;
use std::fmt;
use std::sync::Arc;

/// Codecs and middlewares for a single route.
///
/// # Example
///
/// ```rust
/// use fnbind_codec::{NoOpDecoder, JsonEncoder};
/// use fnbind_server::RouteSpec;
///
/// let spec = RouteSpec::new(NoOpDecoder, JsonEncoder);
/// ```
#[must_use]
pub struct RouteSpec<D, E> {
    decoder: D,
    encoder: E,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl<D: Decoder, E: Encoder> RouteSpec<D, E> {
    /// Creates a route spec with the given codecs and no middlewares.
    pub fn new(decoder: D, encoder: E) -> Self {
        Self {
            decoder,
            encoder,
            middlewares: Vec::new(),
        }
    }

    /// Appends a middleware that runs only for this route.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }
}

impl<D, E> fmt::Debug for RouteSpec<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

/// A successful response before it becomes an HTTP message.
#[derive(Debug)]
pub(crate) struct Rendered {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Rendered {
    pub(crate) fn into_response(self) -> HttpResponse {
        let mut response = HttpResponse::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

type Call =
    Arc<dyn Fn(&RequestHead, Option<Bytes>) -> BoxFuture<'static, Result<Rendered, BoxFault>> + Send + Sync>;

pub(crate) fn boxed<E: Fault>(fault: E) -> BoxFault {
    Box::new(fault)
}

/// A route ready to serve.
pub(crate) struct Endpoint {
    signature: HandlerSignature,
    gate: Arc<dyn DecodeGate>,
    middlewares: Vec<Arc<dyn Middleware>>,
    call: Call,
}

impl Endpoint {
    /// Validates `handler` against its codecs and erases it.
    ///
    /// Role rules are checked first, then the decoder's and the encoder's
    /// own rules.
    pub(crate) fn new<H, A, D, E>(
        method: &Method,
        path: &str,
        handler: H,
        spec: RouteSpec<D, E>,
    ) -> Result<Self, SignatureError>
    where
        H: Handler<A>,
        A: ArgList + Send + 'static,
        D: Decoder,
        E: Encoder,
    {
        let signature = H::signature();
        signature.validate()?;
        spec.decoder.validate(&signature)?;
        spec.encoder.validate(&signature)?;

        let decoder = Arc::new(spec.decoder);
        let encoder = Arc::new(spec.encoder);
        let gate: Arc<dyn DecodeGate> = Arc::clone(&decoder) as Arc<dyn DecodeGate>;
        let route = format!("{method} {path}");
        let (method, path) = (method.to_string(), path.to_string());

        let call: Call = Arc::new(move |head: &RequestHead, body: Option<Bytes>| {
            let args = match decoder.decode::<A>(head.context(), head.headers(), body.as_ref()) {
                Ok(args) => args,
                Err(e) => {
                    let failed: Result<Rendered, BoxFault> = Err(boxed(e));
                    return Box::pin(std::future::ready(failed))
                        as BoxFuture<'static, Result<Rendered, BoxFault>>;
                }
            };

            let handler = handler.clone();
            let encoder = Arc::clone(&encoder);
            let (method, path) = (method.clone(), path.clone());

            Box::pin(async move {
                let split = invoke(&handler, args).await;
                if split.panicked {
                    tracing::error!(
                        { fields::HTTP_METHOD } = %method,
                        { fields::HTTP_PATH } = %path,
                        "handler panicked"
                    );
                    fnbind_telemetry::metrics::record_panic(&method, &path);
                }
                if let Some(fault) = split.fault {
                    return Err(fault);
                }

                let mut headers = HeaderMap::new();
                let (status, body) = encoder
                    .encode(split.value.as_ref(), &mut headers)
                    .map_err(boxed)?;

                Ok(Rendered {
                    status,
                    headers,
                    body,
                })
            })
        });

        tracing::debug!(route = %route, signature = %signature, "route registered");

        Ok(Self {
            signature,
            gate,
            middlewares: spec.middlewares,
            call,
        })
    }

    /// The handler's validated signature.
    pub(crate) fn signature(&self) -> &HandlerSignature {
        &self.signature
    }

    /// Runs middlewares, decodes, invokes and encodes.
    ///
    /// The body is only read when the handler takes a payload, and never
    /// before the decoder's preflight has passed.
    pub(crate) async fn dispatch<B>(
        &self,
        head: &RequestHead,
        router_middlewares: &[Arc<dyn Middleware>],
        body: &mut B,
    ) -> Result<Rendered, BoxFault>
    where
        B: Body<Data = Bytes> + Unpin,
        B::Error: fmt::Display,
    {
        let chain: Vec<&Arc<dyn Middleware>> =
            router_middlewares.iter().chain(&self.middlewares).collect();
        run_before(chain, head).await?;

        self.gate
            .preflight(head.method(), head.headers())
            .map_err(boxed)?;

        let payload = if self.signature.has_payload() {
            let declared = content_length(head.headers());
            let bytes = read_bounded(body, declared, self.gate.max_body_bytes())
                .await
                .map_err(boxed)?;
            Some(bytes)
        } else {
            None
        };

        (self.call)(head, payload).await
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("signature", &self.signature)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnbind_codec::{JsonDecoder, JsonEncoder, NoOpDecoder, NoOpEncoder, APPLICATION_JSON};
    use fnbind_core::{Payload, Reply, RequestContext, StatusedError};
    use http::header::CONTENT_TYPE;
    use http::Uri;
    use serde::{Deserialize, Serialize};

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
        Ok(Greeting {
            greeting: format!("hello {}", req.name),
        })
    }

    async fn status() -> String {
        "ok".to_string()
    }

    fn json_head(method: Method) -> RequestHead {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, APPLICATION_JSON.parse().unwrap());
        RequestHead::new(method, Uri::from_static("/greet"), headers, RequestContext::mock())
    }

    fn json_endpoint() -> Endpoint {
        Endpoint::new(
            &Method::POST,
            "/greet",
            greet,
            RouteSpec::new(JsonDecoder::new(), JsonEncoder),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let endpoint = json_endpoint();
        let mut body = Full::new(Bytes::from_static(br#"{"name":"ada"}"#));

        let rendered = endpoint
            .dispatch(&json_head(Method::POST), &[], &mut body)
            .await
            .unwrap();

        assert_eq!(rendered.status, StatusCode::OK);
        assert_eq!(rendered.body, r#"{"greeting":"hello ada"}"#);
        assert_eq!(rendered.headers[CONTENT_TYPE], APPLICATION_JSON);
    }

    #[tokio::test]
    async fn test_dispatch_malformed_body() {
        let endpoint = json_endpoint();
        let mut body = Full::new(Bytes::from_static(b"{"));

        let fault = endpoint
            .dispatch(&json_head(Method::POST), &[], &mut body)
            .await
            .unwrap_err();
        assert_eq!(fault.status_code(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_preflight_runs_before_body() {
        let endpoint = json_endpoint();
        let head = RequestHead::new(
            Method::POST,
            Uri::from_static("/greet"),
            HeaderMap::new(),
            RequestContext::mock(),
        );
        let mut body = Full::new(Bytes::from_static(br#"{"name":"ada"}"#));

        let fault = endpoint.dispatch(&head, &[], &mut body).await.unwrap_err();
        assert_eq!(fault.status_code(), Some(StatusCode::UNSUPPORTED_MEDIA_TYPE));

        // Body left untouched for the router to drain.
        assert!(!http_body::Body::is_end_stream(&body));
    }

    #[tokio::test]
    async fn test_payloadless_route_skips_body() {
        let endpoint = Endpoint::new(
            &Method::GET,
            "/status",
            status,
            RouteSpec::new(NoOpDecoder, JsonEncoder),
        )
        .unwrap();
        let head = RequestHead::new(
            Method::GET,
            Uri::from_static("/status"),
            HeaderMap::new(),
            RequestContext::mock(),
        );
        let mut body = Full::new(Bytes::from_static(b"ignored"));

        let rendered = endpoint.dispatch(&head, &[], &mut body).await.unwrap();
        assert_eq!(rendered.body, r#""ok""#);
        assert!(!http_body::Body::is_end_stream(&body));
    }

    #[test]
    fn test_codec_rules_checked_at_registration() {
        let err = Endpoint::new(
            &Method::POST,
            "/greet",
            greet,
            RouteSpec::new(NoOpDecoder, JsonEncoder),
        )
        .unwrap_err();
        assert!(matches!(err, SignatureError::Codec { codec: "noop", .. }));

        let err = Endpoint::new(
            &Method::GET,
            "/status",
            status,
            RouteSpec::new(NoOpDecoder, NoOpEncoder),
        )
        .unwrap_err();
        assert!(matches!(err, SignatureError::Codec { .. }));
    }

    #[test]
    fn test_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), None);
        headers.insert(CONTENT_LENGTH, "42".parse().unwrap());
        assert_eq!(content_length(&headers), Some(42));
        headers.insert(CONTENT_LENGTH, "lots".parse().unwrap());
        assert_eq!(content_length(&headers), None);
    }
}
