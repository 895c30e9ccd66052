//! In-memory client for a [`Router`].

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use fnbind_codec::{JsonDecoder, JsonEncoder};
use fnbind_server::Router;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// Sends requests straight into a [`Router`] without binding a port.
///
/// Requests go through the same pipeline a live server uses: middlewares,
/// decoding, invocation, encoding, error translation and fallback.
///
/// # Example
///
/// ```ignore
/// use fnbind_test::TestClient;
///
/// let mut router = Router::new();
/// router.post("/greet", greet)?;
///
/// let client = TestClient::new(router);
/// let response = client.post("/greet").json(&json!({"name": "ada"})).send().await;
/// response.assert_status(StatusCode::OK);
/// ```
#[must_use]
pub struct TestClient<D = JsonDecoder, E = JsonEncoder> {
    router: Arc<Router<D, E>>,
    default_headers: Vec<(String, String)>,
}

impl<D, E> TestClient<D, E> {
    /// Creates a client that owns `router`.
    pub fn new(router: Router<D, E>) -> Self {
        Self::from_shared(Arc::new(router))
    }

    /// Creates a client over a shared router.
    pub fn from_shared(router: Arc<Router<D, E>>) -> Self {
        Self {
            router,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the router under test.
    #[must_use]
    pub fn router(&self) -> &Router<D, E> {
        &self.router
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D, E> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D, E> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D, E> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D, E> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D, E> {
        self.request(Method::DELETE, uri)
    }

    /// Starts an OPTIONS request.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D, E> {
        self.request(Method::OPTIONS, uri)
    }

    /// Starts a HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D, E> {
        self.request(Method::HEAD, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_, D, E> {
        let mut builder = TestRequestBuilder::new(method, uri);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest {
            client: self,
            builder,
        }
    }

    /// Serves a built request.
    ///
    /// # Errors
    ///
    /// Returns an error if the response body cannot be buffered.
    pub async fn send_request(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self.router.serve(request.into_http_request()).await;
        TestResponse::from_http(response).await
    }
}

impl<D, E> fmt::Debug for TestClient<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClient")
            .field("routes", &self.router.route_count())
            .field("default_headers", &self.default_headers)
            .finish()
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a, D, E> {
    client: &'a TestClient<D, E>,
    builder: TestRequestBuilder,
}

impl<D, E> TestClientRequest<'_, D, E> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the response cannot be
    /// buffered. Use [`try_send`](Self::try_send) to handle those cases.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request, returning build and read errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the response
    /// cannot be buffered.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send_request(request).await
    }
}
