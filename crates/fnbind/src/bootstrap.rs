//! Wiring a service from an [`FnbindConfig`].

use crate::Error;
use fnbind_codec::JsonEncoder;
use fnbind_config::FnbindConfig;
use fnbind_server::{Router, Server, ShutdownSignal};

/// Builds a router whose default decoder and route metrics follow `config`.
#[must_use]
pub fn router(config: &FnbindConfig) -> Router {
    let router = Router::with_codec(config.decoder.to_decoder(), JsonEncoder);
    if config.server.route_metrics {
        router.enable_route_metrics()
    } else {
        router
    }
}

/// Initialises logging and metrics as configured.
///
/// # Errors
///
/// Returns an error if a subscriber or recorder is already installed, or an
/// address or filter does not parse.
pub fn init_telemetry(config: &FnbindConfig) -> Result<(), Error> {
    fnbind_telemetry::init_logging(&config.logging.to_log_config())?;
    if config.metrics.enabled {
        fnbind_telemetry::init_metrics(&config.metrics.to_metrics_config())?;
    }
    Ok(())
}

/// Runs `router` on the configured address until SIGTERM or SIGINT.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn serve(config: &FnbindConfig, router: Router) -> Result<(), Error> {
    serve_with_shutdown(config, router, ShutdownSignal::with_os_signals()).await
}

/// Runs `router` on the configured address until `shutdown` fires.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn serve_with_shutdown(
    config: &FnbindConfig,
    router: Router,
    shutdown: ShutdownSignal,
) -> Result<(), Error> {
    tracing::info!(
        routes = router.route_count(),
        addr = %config.server.http_addr,
        "starting fnbind service"
    );
    Server::new(config.server.to_server_config(), router)
        .run_with_shutdown(shutdown)
        .await?;
    Ok(())
}
