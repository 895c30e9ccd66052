//! A small greeting service.
//!
//! ```text
//! cargo run -p fnbind --example greet
//! curl -s -XPOST localhost:8080/greet -H 'content-type: application/json' -d '{"name":"ada"}'
//! ```
//!
//! Settings come from `fnbind.toml` if present and `FNBIND__*` variables,
//! e.g. `FNBIND__SERVER__HTTP_ADDR=127.0.0.1:3000`. Files under `./public`
//! are served for unmatched GET requests when that directory exists.

use fnbind::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

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

async fn greet(ctx: RequestContext, req: Greet) -> Result<Greeting, StatusedError> {
    if req.name.trim().is_empty() {
        return Err(StatusedError::bad_request("name must not be empty"));
    }
    tracing::info!(request_id = %ctx.request_id(), name = %req.name, "greeting");
    Ok(Greeting {
        greeting: format!("hello {}", req.name),
    })
}

async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Rejects requests without a `user-agent`.
struct RequireUserAgent;

impl Middleware for RequireUserAgent {
    fn name(&self) -> &'static str {
        "require-user-agent"
    }

    fn before<'a>(
        &'a self,
        head: &'a RequestHead,
    ) -> fnbind::server::BoxFuture<'a, Result<(), BoxFault>> {
        Box::pin(async move {
            if head.headers().contains_key("user-agent") {
                Ok(())
            } else {
                Err(Box::new(StatusedError::bad_request("user-agent header required")) as BoxFault)
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), fnbind::Error> {
    let config = ConfigLoader::new()
        .with_dotenv()?
        .with_optional_file("fnbind.toml")?
        .with_env_prefix(fnbind::config::DEFAULT_ENV_PREFIX)
        .load()?;
    fnbind::init_telemetry(&config)?;

    let mut router = fnbind::router(&config).middleware(RequireUserAgent);
    if Path::new("public").is_dir() {
        router = router.with_fallback(SpaAssets::new("public"));
    }

    router.post("/greet", greet)?;
    router.get("/version", version)?;

    fnbind::serve(&config, router).await
}
