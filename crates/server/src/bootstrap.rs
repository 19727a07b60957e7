use std::sync::Arc;

use golds_core::config::AppConfig;
use golds_db::{connect_with_settings, migrations, DbPool, SqlCounterStore};
use golds_wecom::{
    default_registry, CommandTable, GoldCounters, HandlerRegistry, MessageDispatcher,
    TextMessageHandler,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub registry: Arc<HandlerRegistry>,
    pub dispatcher: MessageDispatcher,
    pub counters: Arc<GoldCounters>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let store = Arc::new(SqlCounterStore::new(db_pool.clone()));
    let table = CommandTable::from_config(&config.golds.commands);
    let text_handler =
        Arc::new(TextMessageHandler::new(table, Arc::new(GoldCounters::new(store))));
    let counters = text_handler.counters();

    // Registration completes here; the registry is read-only once shared.
    let registry = Arc::new(default_registry(text_handler));
    for (message_type, _) in registry.entries() {
        info!(
            event_name = "system.bootstrap.handler_registered",
            correlation_id = "bootstrap",
            message_type = %message_type,
            "message handler registered"
        );
    }

    Ok(Application {
        dispatcher: MessageDispatcher::new(registry.clone()),
        config,
        db_pool,
        registry,
        counters,
    })
}
