//! Release scheduler entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration** from flags, the environment, and an optional
//!    `.env` file ([`config`]).
//! 2. **Wire observability**: `tracing-subscriber` with a text or JSON layer,
//!    plus an OpenTelemetry OTLP exporter when an endpoint is configured
//!    ([`telemetry`]).
//! 3. **Construct infrastructure**: the content management client (checked
//!    against the configured space and environment before serving) and, when
//!    configured, the work-tracking client.
//! 4. **Serve** the webhook and work-item routes until Ctrl+C or SIGTERM.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use contentful::ContentfulClient;
use devops::DevOpsClient;
use listener::{create_router, serve, AppState};
use release::WorkItemTracker;
use scheduler::ReleaseScheduler;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    let result = run(config).await;
    if let Err(err) = &result {
        error!("Release scheduler stopped with an error: {err:#}");
    }
    telemetry.shutdown();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    let scheduler_settings = config.scheduler_settings()?;
    let devops_settings = config.devops_settings()?;

    let content = ContentfulClient::new(config.contentful_settings())
        .context("failed to build content management client")?;
    content
        .verify_environment()
        .await
        .context("content space or environment is not reachable")?;

    let work_items: Option<Arc<dyn WorkItemTracker>> = match devops_settings {
        Some(settings) => {
            info!(base_url = %settings.base_url, "Work-item proxy enabled");
            let client =
                DevOpsClient::new(settings).context("failed to build work-tracking client")?;
            Some(Arc::new(client))
        }
        None => {
            info!("Work-item proxy disabled; work-tracking credentials not set");
            None
        }
    };

    let scheduler = ReleaseScheduler::new(Arc::new(content), scheduler_settings);
    let router = create_router(
        AppState {
            scheduler: Arc::new(scheduler),
        },
        work_items,
    );

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    serve(listener, router, shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
