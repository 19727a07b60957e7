use crate::commands::CommandResult;
use golds_core::config::{AppConfig, LoadOptions};
use golds_db::{connect_with_settings, migrations, DbPool};

pub(crate) type StepFailure = (&'static str, String, u8);

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return config_failure("migrate", &error),
    };

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return runtime_failure("migrate", &error),
    };

    let result = runtime.block_on(async {
        let pool = open_migrated(&config).await?;
        pool.close().await;
        Ok::<(), StepFailure>(())
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

pub(crate) fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}

pub(crate) fn config_failure(command: &str, error: &impl std::fmt::Display) -> CommandResult {
    CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
}

pub(crate) fn runtime_failure(command: &str, error: &impl std::fmt::Display) -> CommandResult {
    CommandResult::failure(
        command,
        "runtime_init",
        format!("failed to initialize async runtime: {error}"),
        3,
    )
}

/// Connects with the configured pool settings and applies pending migrations.
pub(crate) async fn open_migrated(config: &AppConfig) -> Result<DbPool, StepFailure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}
