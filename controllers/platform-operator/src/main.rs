//! VirtOps Platform Operator
//!
//! Watches the VirtPlatform CR and keeps the virtualization platform's
//! operands (console plugin and proxy, their services and config maps, the
//! ConsolePlugin registration, the node labeller, the priority class and
//! the ClusterServiceVersion annotations) converged to it.

mod backoff;
mod controller;
mod error;
mod metrics_server;
mod reconcile_helpers;
mod reconciler;
mod watcher;

#[cfg(test)]
mod reconcile_helpers_test;

use controller::Controller;
use crate::error::ControllerError;
use operands::{Metrics, OperatorConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube and the metrics server share one rustls provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting VirtOps Platform Operator");

    // Load configuration from environment variables
    let config = Arc::new(OperatorConfig::from_env()?);
    let metrics_addr: SocketAddr = config.metrics_addr.parse().map_err(|e| {
        ControllerError::InvalidConfig(format!("METRICS_ADDR {:?}: {}", config.metrics_addr, e))
    })?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace);
    info!("  Operator version: {}", config.version);
    info!("  Metrics address: {}", metrics_addr);
    info!("  CSV: {}", config.csv_name.as_deref().unwrap_or("none"));

    let metrics = Arc::new(Metrics::new()?);
    let shutdown = CancellationToken::new();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
        }
        signal_token.cancel();
    });

    let server = tokio::spawn(metrics_server::serve(metrics_addr, metrics.clone(), shutdown.clone()));

    // Initialize and run controller
    let controller = Controller::new(config, metrics, shutdown.clone()).await?;
    let result = controller.run().await;

    shutdown.cancel();
    match server.await {
        Ok(Err(e)) => error!("Metrics server failed: {}", e),
        Err(e) => error!("Metrics server task panicked: {}", e),
        Ok(Ok(())) => {}
    }

    result
}
