use std::sync::Arc;

use adla_dashboard::{
    dashboard_router, init_logging, log_app_bind, log_app_start, log_source_selected,
    wait_until_ready, DashboardApi, DashboardConfig, HttpDashboardApi, InMemoryDashboardApi,
    ListingFilter, LoggingConfig,
};
use tokio::sync::watch;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = LoggingConfig::from_env();
    init_logging(&logging_cfg)?;

    let cfg = DashboardConfig::from_env()?;
    log_app_start(&logging_cfg, &cfg);
    log_source_selected(&cfg);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let api: Arc<dyn DashboardApi> = if cfg.use_demo {
        Arc::new(InMemoryDashboardApi::demo())
    } else {
        let api: Arc<dyn DashboardApi> = Arc::new(HttpDashboardApi::new(cfg.api.clone())?);
        spawn_readiness_check(Arc::clone(&api), &cfg, cancel_rx);
        api
    };

    let app = dashboard_router(api);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(component = "dashboard_server", event = "app.signal.error", error = %err);
            }
            let _ = cancel_tx.send(true);
        })
        .await?;

    Ok(())
}

/// Pages still render with retry panels while the backend is down; the check
/// only reports when it becomes reachable.
fn spawn_readiness_check(
    api: Arc<dyn DashboardApi>,
    cfg: &DashboardConfig,
    cancel: watch::Receiver<bool>,
) {
    let readiness = cfg.readiness;
    tokio::spawn(async move {
        let check = || {
            let api = Arc::clone(&api);
            async move {
                tokio::task::spawn_blocking(move || api.listings(ListingFilter::All).map(|_| ()))
                    .await
                    .map_err(|err| err.to_string())
                    .and_then(|result| result.map_err(|err| err.to_string()))
            }
        };
        if let Err(err) = wait_until_ready("analytics backend", readiness, cancel, check).await {
            warn!(component = "dashboard_server", event = "backend.readiness.failed", error = %err);
        }
    });
}
