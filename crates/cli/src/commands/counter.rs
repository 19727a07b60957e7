use std::sync::Arc;

use golds_core::config::{AppConfig, LoadOptions};
use golds_core::{CounterError, CounterOp};
use golds_db::SqlCounterStore;
use golds_wecom::GoldCounters;

use crate::commands::migrate::{build_runtime, config_failure, open_migrated, runtime_failure};
use crate::commands::CommandResult;

pub fn run(op: CounterOp, identity: &str) -> CommandResult {
    let command = format!("counter {}", command_verb(op));

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return config_failure(&command, &error),
    };

    let identity = identity.trim();
    if identity.is_empty() || identity.chars().any(char::is_whitespace) {
        return CommandResult::failure(
            &command,
            "invalid_identity",
            "identity must be non-empty and contain no whitespace",
            2,
        );
    }

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return runtime_failure(&command, &error),
    };

    runtime.block_on(async {
        let pool = match open_migrated(&config).await {
            Ok(pool) => pool,
            Err((error_class, message, exit_code)) => {
                return CommandResult::failure(&command, error_class, message, exit_code);
            }
        };

        let counters = GoldCounters::new(Arc::new(SqlCounterStore::new(pool.clone())));
        let outcome = match op {
            CounterOp::Read => counters.read(identity).await.map(Some),
            CounterOp::Increment => counters.increment(identity).await.map(Some),
            CounterOp::Reset => counters.reset(identity).await.map(|()| None),
        };
        pool.close().await;

        match outcome {
            Ok(Some(value)) => {
                CommandResult::counter_success(&command, identity, Some(value), value.to_string())
            }
            Ok(None) => CommandResult::counter_success(&command, identity, None, "counter reset"),
            Err(error) => {
                let (error_class, exit_code) = classify(&error);
                CommandResult::counter_failure(
                    &command,
                    identity,
                    error_class,
                    error.to_string(),
                    exit_code,
                )
            }
        }
    })
}

fn command_verb(op: CounterOp) -> &'static str {
    match op {
        CounterOp::Read => "get",
        CounterOp::Increment => "incr",
        CounterOp::Reset => "reset",
    }
}

fn classify(error: &CounterError) -> (&'static str, u8) {
    match error {
        CounterError::NotFound { .. } => ("not_found", 1),
        CounterError::StoreUnavailable(_) => ("store_unavailable", 6),
        CounterError::MalformedValue { .. } => ("malformed_value", 7),
        CounterError::Overflow { .. } => ("overflow", 8),
    }
}
