use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use golds_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: &[(&str, String, &[&str])] = &[
        ("database.url", config.database.url.clone(), &["GOLDS_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["GOLDS_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["GOLDS_DATABASE_TIMEOUT_SECS"],
        ),
        ("wecom.corp_id", or_unset(&config.wecom.corp_id), &["GOLDS_WECOM_CORP_ID"]),
        ("wecom.agent_id", config.wecom.agent_id.to_string(), &["GOLDS_WECOM_AGENT_ID"]),
        ("wecom.corp_secret", redact(&config.wecom.corp_secret), &["GOLDS_WECOM_CORP_SECRET"]),
        ("wecom.token", redact(&config.wecom.token), &["GOLDS_WECOM_TOKEN"]),
        (
            "wecom.encoding_aes_key",
            redact(&config.wecom.encoding_aes_key),
            &["GOLDS_WECOM_ENCODING_AES_KEY"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["GOLDS_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["GOLDS_SERVER_PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["GOLDS_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "server.request_timeout_secs",
            config.server.request_timeout_secs.to_string(),
            &["GOLDS_SERVER_REQUEST_TIMEOUT_SECS"],
        ),
        ("golds.http_identity", config.golds.http_identity.clone(), &["GOLDS_HTTP_IDENTITY"]),
        ("golds.commands", describe_commands(&config), &[]),
        (
            "scheduler.enabled",
            config.scheduler.enabled.to_string(),
            &["GOLDS_SCHEDULER_ENABLED"],
        ),
        ("scheduler.hour", config.scheduler.hour.to_string(), &["GOLDS_SCHEDULER_HOUR"]),
        ("scheduler.minute", config.scheduler.minute.to_string(), &["GOLDS_SCHEDULER_MINUTE"]),
        ("scheduler.second", config.scheduler.second.to_string(), &["GOLDS_SCHEDULER_SECOND"]),
        ("logging.level", config.logging.level.clone(), &["GOLDS_LOGGING_LEVEL", "GOLDS_LOG_LEVEL"]),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["GOLDS_LOGGING_FORMAT", "GOLDS_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, value, source));
    }

    lines.join("\n")
}

fn describe_commands(config: &AppConfig) -> String {
    if config.golds.commands.is_empty() {
        return "<built-in>".to_string();
    }

    config
        .golds
        .commands
        .iter()
        .map(|entry| format!("{}→{}:{}", entry.command, entry.identity, entry.op.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("golds.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/golds.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    // Blank values are ignored by the loader; the first alias set wins.
    let env_key = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "<unset>".to_string()
    } else {
        value.to_string()
    }
}

fn redact(secret: &SecretString) -> String {
    if secret.expose_secret().trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
