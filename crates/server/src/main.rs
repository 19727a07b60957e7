mod bootstrap;
mod errors;
mod golds;
mod health;
mod scheduler;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use golds_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;

use crate::bootstrap::Application;
use crate::scheduler::{DailyScheduler, ReviewPublishing};

fn init_logging(config: &AppConfig) {
    use golds_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = if app.config.scheduler.enabled {
        let job = Arc::new(ReviewPublishing::new(app.registry.clone()));
        Some(DailyScheduler::new(app.config.scheduler.schedule()?, job).spawn(shutdown_rx.clone()))
    } else {
        tracing::info!(
            event_name = "system.server.scheduler_disabled",
            correlation_id = "bootstrap",
            "daily scheduler disabled by configuration"
        );
        None
    };

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "golds-server listening"
    );

    axum::serve(listener, routes(&app)?)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_tx))
        .await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "golds-server stopping"
    );

    if let Some(handle) = scheduler {
        let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!(
                event_name = "system.server.scheduler_stuck",
                correlation_id = "shutdown",
                "scheduler did not stop within the grace period"
            );
        }
    }
    app.db_pool.close().await;

    Ok(())
}

fn routes(app: &Application) -> Result<Router> {
    let request_timeout = Duration::from_secs(app.config.server.request_timeout_secs);
    let golds_state = golds::GoldsState::new(
        app.counters.clone(),
        app.config.golds.http_identity.clone(),
        golds::init_templates()?,
    );

    Ok(Router::new()
        .merge(webhook::router(webhook::WebhookState::new(app.dispatcher.clone(), request_timeout)))
        .merge(golds::router(golds_state))
        .merge(health::router(health::HealthState::new(
            app.db_pool.clone(),
            app.registry.message_types(),
        ))))
}

async fn wait_for_shutdown(shutdown_tx: watch::Sender<bool>) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_failed",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for ctrl-c; shutting down"
        );
    }
    let _ = shutdown_tx.send(true);
}
