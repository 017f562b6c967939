pub mod assets;
pub mod collector;
pub mod config;
pub mod errors;
pub mod identity;
pub mod metrics_defs;
pub mod page;
pub mod payload;
pub mod query;
pub mod reporter;
pub mod resolver;
pub mod selector;
pub mod service;
#[cfg(test)]
mod testutils;

use crate::assets::Assets;
use crate::collector::HttpCollector;
use crate::config::Config;
use crate::errors::{RelayError, Result};
use crate::reporter::Reporter;
use crate::service::{Beacon, BeaconService};
use shared::admin_service::AdminService;
use shared::http::{bind, run_http_service, serve_listener};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Serves beacon requests until the process receives Ctrl-C or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    run_until(config, shutdown_signal()).await
}

/// Serves beacon requests until `shutdown` completes, then waits up to the
/// configured grace period for in-flight deliveries.
pub async fn run_until<S>(config: Config, shutdown: S) -> Result<()>
where
    S: Future<Output = ()>,
{
    config.validate()?;

    let assets = Arc::new(Assets::load(&config.assets_dir)?);
    let reporter = Reporter::new(Arc::new(HttpCollector::new(config.collector.url.clone())));
    let beacon = Arc::new(Beacon::new(
        assets,
        reporter.clone(),
        config.project_url.clone(),
    ));
    shared::metrics_defs::describe_metrics(metrics_defs::ALL_METRICS);

    let ready = Arc::new(AtomicBool::new(false));

    let beacon_task = {
        let ready = ready.clone();
        let listener = &config.listener;
        async move {
            let socket = bind(&listener.host, listener.port).await?;
            tracing::info!(host = %listener.host, port = listener.port, "Beacon listening");
            ready.store(true, Ordering::Relaxed);

            serve_listener(socket, move |remote_addr| {
                BeaconService::new(beacon.clone(), remote_addr)
            })
            .await
        }
    };

    let admin_task = async {
        match &config.admin_listener {
            Some(admin) => {
                tracing::info!(host = %admin.host, port = admin.port, "Admin listening");
                run_http_service(&admin.host, admin.port, |_| {
                    let ready = ready.clone();
                    AdminService::<_, RelayError>::new(move || ready.load(Ordering::Relaxed))
                })
                .await
            }
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        result = async { tokio::try_join!(beacon_task, admin_task) } => {
            result?;
        }
        _ = shutdown => {
            tracing::info!("Shutting down");
        }
    }

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    if !reporter.drain(grace).await {
        tracing::warn!(
            pending = reporter.inflight(),
            "Abandoning in-flight collector deliveries"
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
