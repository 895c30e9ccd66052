//! What the router answers when no route matches.
//!
//! [`NotFound`] answers an empty `404`. [`SpaAssets`] serves files from a
//! directory and answers unknown paths with the directory's `index.html`,
//! so a single-page application can own client-side routes.
//!
//! # Example
//!
//! ```rust
//! use fnbind_server::{Router, SpaAssets};
//!
//! let router = Router::new().with_fallback(SpaAssets::new("./web/dist"));
//! ```
//!
//! # Security
//!
//! - Paths containing `..` are rejected with `403`
//! - Hidden files (leading `.`) are never served
//! - Resolved paths must stay inside the root directory

use crate::middleware::{BoxFuture, RequestHead};
use crate::HttpResponse;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use http_body_util::Full;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Answers requests that matched no route.
pub trait Fallback: Send + Sync + 'static {
    /// Produces the response for `head`.
    fn respond<'a>(&'a self, head: &'a RequestHead) -> BoxFuture<'a, HttpResponse>;
}

/// The default fallback: an empty `404 Not Found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl Fallback for NotFound {
    fn respond<'a>(&'a self, _head: &'a RequestHead) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async { empty(StatusCode::NOT_FOUND) })
    }
}

/// Errors resolving an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Nothing to serve, not even the index.
    #[error("asset not found: {0}")]
    NotFound(String),

    /// The path tries to leave the root or names a hidden file.
    #[error("forbidden path: {0}")]
    Forbidden(String),

    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetError {
    /// The status this error is answered with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Serves a single-page application's files.
///
/// `GET` and `HEAD` requests are answered from `root`; any path that does
/// not name a file gets the index document instead. Other methods get
/// `404`.
#[derive(Debug, Clone)]
pub struct SpaAssets {
    root: PathBuf,
    index: String,
}

impl SpaAssets {
    /// Serves files under `root`, falling back to `index.html`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index: "index.html".to_string(),
        }
    }

    /// Sets the document served for unknown paths.
    #[must_use]
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// The asset root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path to the file to serve.
    ///
    /// Missing files and directories resolve to the index document.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, AssetError> {
        let relative = request_path.trim_start_matches('/');

        for component in Path::new(relative).components() {
            match component {
                Component::ParentDir => {
                    return Err(AssetError::Forbidden(request_path.to_string()));
                }
                Component::Normal(name) if name.to_string_lossy().starts_with('.') => {
                    return Err(AssetError::Forbidden(request_path.to_string()));
                }
                _ => {}
            }
        }

        let root = self
            .root
            .canonicalize()
            .map_err(|_| AssetError::NotFound(self.root.display().to_string()))?;

        let candidate = root.join(relative);
        let target = match candidate.canonicalize() {
            Ok(path) if path.is_file() => path,
            _ => root.join(&self.index),
        };

        if !target.starts_with(&root) {
            return Err(AssetError::Forbidden(request_path.to_string()));
        }
        if !target.is_file() {
            return Err(AssetError::NotFound(request_path.to_string()));
        }

        Ok(target)
    }

    async fn load(&self, head: &RequestHead) -> Result<HttpResponse, AssetError> {
        let path = self.resolve(head.path())?;
        let contents = tokio::fs::read(&path).await?;
        let length = contents.len();

        let body = if *head.method() == Method::HEAD {
            Bytes::new()
        } else {
            Bytes::from(contents)
        };

        let mut response = HttpResponse::new(Full::new(body));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(mime_type(&path)));
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(length));
        Ok(response)
    }
}

impl Fallback for SpaAssets {
    fn respond<'a>(&'a self, head: &'a RequestHead) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            if *head.method() != Method::GET && *head.method() != Method::HEAD {
                return empty(StatusCode::NOT_FOUND);
            }

            match self.load(head).await {
                Ok(response) => response,
                Err(e) => {
                    if matches!(e, AssetError::Io(_)) {
                        tracing::error!(path = head.path(), error = %e, "failed to read asset");
                    } else {
                        tracing::debug!(path = head.path(), error = %e, "asset not served");
                    }
                    empty(e.status_code())
                }
            }
        })
    }
}

pub(crate) fn empty(status: StatusCode) -> HttpResponse {
    let mut response = HttpResponse::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "wasm" => "application/wasm",
        "webmanifest" => "application/manifest+json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnbind_core::RequestContext;
    use http::{HeaderMap, Uri};
    use http_body_util::BodyExt;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log('hi')").unwrap();
        fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/logo.svg"), "<svg/>").unwrap();
        dir
    }

    fn head(method: Method, path: &'static str) -> RequestHead {
        RequestHead::new(
            method,
            Uri::from_static(path),
            HeaderMap::new(),
            RequestContext::mock(),
        )
    }

    async fn body_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_fallback() {
        let response = NotFound.respond(&head(Method::GET, "/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let dir = create_test_dir();
        let assets = SpaAssets::new(dir.path());

        let response = assets.respond(&head(Method::GET, "/app.js")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );
        assert_eq!(body_string(response).await, "console.log('hi')");
    }

    #[tokio::test]
    async fn test_serves_nested_file() {
        let dir = create_test_dir();
        let assets = SpaAssets::new(dir.path());

        let response = assets.respond(&head(Method::GET, "/assets/logo.svg")).await;
        assert_eq!(response.headers()[CONTENT_TYPE], "image/svg+xml");
    }

    #[tokio::test]
    async fn test_unknown_path_gets_index() {
        let dir = create_test_dir();
        let assets = SpaAssets::new(dir.path());

        for path in ["/", "/settings/profile", "/assets"] {
            let response = assets.respond(&head(Method::GET, path)).await;
            assert_eq!(response.status(), StatusCode::OK, "{path}");
            assert_eq!(body_string(response).await, "<html>app</html>");
        }
    }

    #[tokio::test]
    async fn test_traversal_blocked() {
        let dir = create_test_dir();
        let assets = SpaAssets::new(dir.path());

        let response = assets.respond(&head(Method::GET, "/../etc/passwd")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_hidden_files_blocked() {
        let dir = create_test_dir();
        let assets = SpaAssets::new(dir.path());

        let response = assets.respond(&head(Method::GET, "/.env")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = create_test_dir();
        let assets = SpaAssets::new(dir.path());

        let response = assets.respond(&head(Method::HEAD, "/app.js")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "17");
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_not_found() {
        let dir = create_test_dir();
        let assets = SpaAssets::new(dir.path());

        let response = assets.respond(&head(Method::POST, "/app.js")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_index() {
        let dir = TempDir::new().unwrap();
        let assets = SpaAssets::new(dir.path());

        let response = assets.respond(&head(Method::GET, "/anything")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_custom_index() {
        let dir = create_test_dir();
        fs::write(dir.path().join("shell.html"), "shell").unwrap();
        let assets = SpaAssets::new(dir.path()).index("shell.html");

        let resolved = assets.resolve("/nowhere").unwrap();
        assert!(resolved.ends_with("shell.html"));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type(Path::new("a.HTML")), "text/html; charset=utf-8");
        assert_eq!(mime_type(Path::new("a.wasm")), "application/wasm");
        assert_eq!(mime_type(Path::new("a")), "application/octet-stream");
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AssetError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AssetError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
