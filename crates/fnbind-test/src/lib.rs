//! # fnbind Test
//!
//! In-memory HTTP testing for fnbind routers. Requests run through the
//! full router pipeline without opening a socket.
//!
//! ## Example
//!
//! ```ignore
//! use fnbind_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn greets() {
//!     let mut router = Router::new();
//!     router.post("/greet", greet).unwrap();
//!     let client = TestClient::new(router);
//!
//!     client
//!         .post("/greet")
//!         .json(&json!({"name": "ada"}))
//!         .send()
//!         .await
//!         .assert_status(StatusCode::OK)
//!         .assert_json_eq(&json!({"greeting": "hello ada"}));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/fnbind-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
