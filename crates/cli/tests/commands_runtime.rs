use std::env;
use std::sync::{Mutex, OnceLock};

use golds_cli::commands::{config, counter, migrate};
use golds_core::CounterOp;
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("GOLDS_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("GOLDS_DATABASE_URL", "postgres://localhost/golds")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn counter_commands_share_one_database_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("golds.db").display());

    with_env(&[("GOLDS_DATABASE_URL", &url)], || {
        let first = counter::run(CounterOp::Increment, "duxingye");
        assert_eq!(first.exit_code, 0);
        assert_eq!(parse_payload(&first.output)["value"], 1);

        let second = counter::run(CounterOp::Increment, "duxingye");
        assert_eq!(parse_payload(&second.output)["value"], 2);

        let read = counter::run(CounterOp::Read, "duxingye");
        let payload = parse_payload(&read.output);
        assert_eq!(payload["command"], "counter get");
        assert_eq!(payload["identity"], "duxingye");
        assert_eq!(payload["value"], 2);
        assert_eq!(payload["message"], "2");

        let reset = counter::run(CounterOp::Reset, "duxingye");
        assert_eq!(reset.exit_code, 0);
        let payload = parse_payload(&reset.output);
        assert_eq!(payload["message"], "counter reset");
        assert!(payload.get("value").is_none());

        let cleared = counter::run(CounterOp::Read, "duxingye");
        assert_eq!(cleared.exit_code, 1, "expected not-found exit code");
        let payload = parse_payload(&cleared.output);
        assert_eq!(payload["error_class"], "not_found");
        assert_eq!(payload["identity"], "duxingye");
    });
}

#[test]
fn counter_rejects_blank_identity() {
    with_env(&[("GOLDS_DATABASE_URL", "sqlite::memory:")], || {
        let result = counter::run(CounterOp::Increment, "  ");
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "counter incr");
        assert_eq!(payload["error_class"], "invalid_identity");
    });
}

#[test]
fn config_output_redacts_secrets_and_attributes_sources() {
    with_env(
        &[
            ("GOLDS_WECOM_CORP_ID", "ww0123456789abcdef"),
            ("GOLDS_WECOM_CORP_SECRET", "super-secret-value"),
            ("GOLDS_SERVER_PORT", "9090"),
        ],
        || {
            let output = config::run();

            assert!(output.contains("- wecom.corp_id = ww0123456789abcdef (source: env (GOLDS_WECOM_CORP_ID))"));
            assert!(output.contains("- wecom.corp_secret = <redacted> (source: env (GOLDS_WECOM_CORP_SECRET))"));
            assert!(output.contains("- wecom.token = <empty> (source: default)"));
            assert!(output.contains("- server.port = 9090 (source: env (GOLDS_SERVER_PORT))"));
            assert!(output.contains("- golds.commands = <built-in> (source: default)"));
            assert!(!output.contains("super-secret-value"));
        },
    );
}

#[test]
fn config_output_attributes_alias_env_and_ignores_blank_values() {
    with_env(&[("GOLDS_LOG_LEVEL", "debug"), ("GOLDS_SERVER_PORT", "   ")], || {
        let output = config::run();

        assert!(output.contains("- logging.level = debug (source: env (GOLDS_LOG_LEVEL))"));
        assert!(output.contains("- server.port = 8080 (source: default)"));
    });
}

#[test]
fn config_output_reports_validation_failure() {
    with_env(&[("GOLDS_SERVER_REQUEST_TIMEOUT_SECS", "0")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed:"), "unexpected output: {output}");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "GOLDS_DATABASE_URL",
        "GOLDS_DATABASE_MAX_CONNECTIONS",
        "GOLDS_DATABASE_TIMEOUT_SECS",
        "GOLDS_WECOM_CORP_ID",
        "GOLDS_WECOM_AGENT_ID",
        "GOLDS_WECOM_CORP_SECRET",
        "GOLDS_WECOM_TOKEN",
        "GOLDS_WECOM_ENCODING_AES_KEY",
        "GOLDS_SERVER_BIND_ADDRESS",
        "GOLDS_SERVER_PORT",
        "GOLDS_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "GOLDS_SERVER_REQUEST_TIMEOUT_SECS",
        "GOLDS_HTTP_IDENTITY",
        "GOLDS_SCHEDULER_ENABLED",
        "GOLDS_SCHEDULER_HOUR",
        "GOLDS_SCHEDULER_MINUTE",
        "GOLDS_SCHEDULER_SECOND",
        "GOLDS_LOGGING_LEVEL",
        "GOLDS_LOGGING_FORMAT",
        "GOLDS_LOG_LEVEL",
        "GOLDS_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
