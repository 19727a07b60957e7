use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::counters::CounterOp;
use crate::schedule::{DailySchedule, ScheduleError};

/// WeCom EncodingAESKey values are always 43 base64 characters.
const ENCODING_AES_KEY_LEN: usize = 43;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub wecom: WeComConfig,
    pub server: ServerConfig,
    pub golds: GoldsConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WeComConfig {
    pub corp_id: String,
    pub agent_id: i64,
    pub corp_secret: SecretString,
    pub token: SecretString,
    pub encoding_aes_key: SecretString,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct GoldsConfig {
    /// Identity whose counter backs the `/golds` page.
    pub http_identity: String,
    /// Empty means the built-in command table.
    pub commands: Vec<CommandConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub command: String,
    pub identity: String,
    pub op: CounterOp,
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl SchedulerConfig {
    pub fn schedule(&self) -> Result<DailySchedule, ScheduleError> {
        DailySchedule::new(self.hour, self.minute, self.second)
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub http_identity: Option<String>,
    pub scheduler_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://golds.db".to_string(),
                max_connections: 5,
                timeout_secs: 5,
            },
            wecom: WeComConfig {
                corp_id: String::new(),
                agent_id: 0,
                corp_secret: String::new().into(),
                token: String::new().into(),
                encoding_aes_key: String::new().into(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 5,
                request_timeout_secs: 5,
            },
            golds: GoldsConfig { http_identity: "duxingye".to_string(), commands: Vec::new() },
            scheduler: SchedulerConfig { enabled: true, hour: 23, minute: 0, second: 0 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("golds.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(wecom) = patch.wecom {
            if let Some(corp_id) = wecom.corp_id {
                self.wecom.corp_id = corp_id;
            }
            if let Some(agent_id) = wecom.agent_id {
                self.wecom.agent_id = agent_id;
            }
            if let Some(corp_secret) = wecom.corp_secret {
                self.wecom.corp_secret = secret_value(corp_secret);
            }
            if let Some(token) = wecom.token {
                self.wecom.token = secret_value(token);
            }
            if let Some(encoding_aes_key) = wecom.encoding_aes_key {
                self.wecom.encoding_aes_key = secret_value(encoding_aes_key);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(request_timeout_secs) = server.request_timeout_secs {
                self.server.request_timeout_secs = request_timeout_secs;
            }
        }

        if let Some(golds) = patch.golds {
            if let Some(http_identity) = golds.http_identity {
                self.golds.http_identity = http_identity;
            }
            if let Some(commands) = golds.commands {
                self.golds.commands = commands;
            }
        }

        if let Some(scheduler) = patch.scheduler {
            if let Some(enabled) = scheduler.enabled {
                self.scheduler.enabled = enabled;
            }
            if let Some(hour) = scheduler.hour {
                self.scheduler.hour = hour;
            }
            if let Some(minute) = scheduler.minute {
                self.scheduler.minute = minute;
            }
            if let Some(second) = scheduler.second {
                self.scheduler.second = second;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("GOLDS_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("GOLDS_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("GOLDS_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("GOLDS_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("GOLDS_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GOLDS_WECOM_CORP_ID") {
            self.wecom.corp_id = value;
        }
        if let Some(value) = read_env("GOLDS_WECOM_AGENT_ID") {
            self.wecom.agent_id = parse_i64("GOLDS_WECOM_AGENT_ID", &value)?;
        }
        if let Some(value) = read_env("GOLDS_WECOM_CORP_SECRET") {
            self.wecom.corp_secret = secret_value(value);
        }
        if let Some(value) = read_env("GOLDS_WECOM_TOKEN") {
            self.wecom.token = secret_value(value);
        }
        if let Some(value) = read_env("GOLDS_WECOM_ENCODING_AES_KEY") {
            self.wecom.encoding_aes_key = secret_value(value);
        }

        if let Some(value) = read_env("GOLDS_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("GOLDS_SERVER_PORT") {
            self.server.port = parse_u16("GOLDS_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("GOLDS_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("GOLDS_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("GOLDS_SERVER_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs =
                parse_u64("GOLDS_SERVER_REQUEST_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GOLDS_HTTP_IDENTITY") {
            self.golds.http_identity = value;
        }

        if let Some(value) = read_env("GOLDS_SCHEDULER_ENABLED") {
            self.scheduler.enabled = parse_bool("GOLDS_SCHEDULER_ENABLED", &value)?;
        }
        if let Some(value) = read_env("GOLDS_SCHEDULER_HOUR") {
            self.scheduler.hour = parse_u32("GOLDS_SCHEDULER_HOUR", &value)?;
        }
        if let Some(value) = read_env("GOLDS_SCHEDULER_MINUTE") {
            self.scheduler.minute = parse_u32("GOLDS_SCHEDULER_MINUTE", &value)?;
        }
        if let Some(value) = read_env("GOLDS_SCHEDULER_SECOND") {
            self.scheduler.second = parse_u32("GOLDS_SCHEDULER_SECOND", &value)?;
        }

        let log_level = read_env("GOLDS_LOGGING_LEVEL").or_else(|| read_env("GOLDS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("GOLDS_LOGGING_FORMAT").or_else(|| read_env("GOLDS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(http_identity) = overrides.http_identity {
            self.golds.http_identity = http_identity;
        }
        if let Some(enabled) = overrides.scheduler_enabled {
            self.scheduler.enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_wecom(&self.wecom)?;
        validate_server(&self.server)?;
        validate_golds(&self.golds)?;
        validate_scheduler(&self.scheduler)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("golds.toml"), PathBuf::from("config/golds.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_wecom(wecom: &WeComConfig) -> Result<(), ConfigError> {
    if wecom.agent_id < 0 {
        return Err(ConfigError::Validation(
            "wecom.agent_id must not be negative. Find it under 应用管理 > 自建应用 > AgentId"
                .to_string(),
        ));
    }

    let aes_key = wecom.encoding_aes_key.expose_secret();
    if !aes_key.is_empty() && aes_key.len() != ENCODING_AES_KEY_LEN {
        return Err(ConfigError::Validation(format!(
            "wecom.encoding_aes_key must be {ENCODING_AES_KEY_LEN} characters (got {})",
            aes_key.len()
        )));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if server.request_timeout_secs == 0 || server.request_timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "server.request_timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_golds(golds: &GoldsConfig) -> Result<(), ConfigError> {
    let identity = golds.http_identity.trim();
    if identity.is_empty() || identity.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "golds.http_identity must be a non-empty identifier without whitespace".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in &golds.commands {
        if !entry.command.starts_with('/') || entry.command.trim() != entry.command {
            return Err(ConfigError::Validation(format!(
                "golds.commands entry `{}` must start with `/` and carry no surrounding whitespace",
                entry.command
            )));
        }
        if !seen.insert(entry.command.as_str()) {
            return Err(ConfigError::Validation(format!(
                "golds.commands entry `{}` is declared more than once",
                entry.command
            )));
        }
        if entry.identity.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "golds.commands entry `{}` is missing an identity",
                entry.command
            )));
        }
    }

    Ok(())
}

fn validate_scheduler(scheduler: &SchedulerConfig) -> Result<(), ConfigError> {
    scheduler.schedule().map(|_| ()).map_err(|error| {
        ConfigError::Validation(format!("scheduler fire time is out of range: {error}"))
    })
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    wecom: Option<WeComPatch>,
    server: Option<ServerPatch>,
    golds: Option<GoldsPatch>,
    scheduler: Option<SchedulerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WeComPatch {
    corp_id: Option<String>,
    agent_id: Option<i64>,
    corp_secret: Option<String>,
    token: Option<String>,
    encoding_aes_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GoldsPatch {
    http_identity: Option<String>,
    commands: Option<Vec<CommandConfig>>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulerPatch {
    enabled: Option<bool>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::counters::CounterOp;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(contents: &str) -> Result<(TempDir, std::path::PathBuf), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("golds.toml");
        fs::write(&path, contents).map_err(|err| err.to_string())?;
        Ok((dir, path))
    }

    #[test]
    fn defaults_are_valid_without_any_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.golds.http_identity == "duxingye", "default identity should be duxingye")?;
        ensure(config.golds.commands.is_empty(), "default command table should be built in")?;
        ensure(config.scheduler.hour == 23, "default scheduler should fire at 23:00")?;
        ensure(config.server.request_timeout_secs == 5, "default request deadline is 5s")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_WECOM_CORP_SECRET", "corp-secret-from-env");
        env::set_var("TEST_WECOM_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let (_dir, path) = write_config(
                r#"
[wecom]
corp_id = "ww0123456789"
agent_id = 1000002
corp_secret = "${TEST_WECOM_CORP_SECRET}"
token = "${TEST_WECOM_TOKEN}"
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.wecom.corp_secret.expose_secret() == "corp-secret-from-env",
                "corp secret should be loaded from environment",
            )?;
            ensure(
                config.wecom.token.expose_secret() == "token-from-env",
                "token should be loaded from environment",
            )?;
            ensure(config.wecom.agent_id == 1_000_002, "agent id should come from file")
        })();

        clear_vars(&["TEST_WECOM_CORP_SECRET", "TEST_WECOM_TOKEN"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_fails() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        env::remove_var("TEST_GOLDS_UNSET_VAR");

        let (_dir, path) = write_config("[wecom]\ntoken = \"${TEST_GOLDS_UNSET_VAR}\"\n")?;
        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });

        ensure(
            matches!(
                result,
                Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "TEST_GOLDS_UNSET_VAR"
            ),
            "missing interpolation variable should be reported by name",
        )
    }

    #[test]
    fn command_table_is_loaded_from_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let (_dir, path) = write_config(
            r#"
[golds]
http_identity = "duxingyi"

[[golds.commands]]
command = "/杜行逸"
identity = "duxingyi"
op = "read"

[[golds.commands]]
command = "/reset-yi"
identity = "duxingyi"
op = "reset"
reply = "杜行逸数据清零"
"#,
        )?;

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.golds.http_identity == "duxingyi", "identity should come from file")?;
        ensure(config.golds.commands.len() == 2, "both command entries should load")?;
        ensure(config.golds.commands[1].op == CounterOp::Reset, "second entry is a reset")?;
        ensure(
            config.golds.commands[1].reply.as_deref() == Some("杜行逸数据清零"),
            "reset confirmation should be kept",
        )
    }

    #[test]
    fn duplicate_or_unprefixed_commands_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let (_dir, path) = write_config(
            r#"
[[golds.commands]]
command = "reset"
identity = "duxingye"
op = "reset"
"#,
        )?;
        let unprefixed =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(unprefixed, Err(ConfigError::Validation(ref message)) if message.contains("must start with `/`")),
            "commands must be slash prefixed",
        )?;

        let (_dir, path) = write_config(
            r#"
[[golds.commands]]
command = "/a"
identity = "u1"
op = "read"

[[golds.commands]]
command = "/a"
identity = "u2"
op = "read"
"#,
        )?;
        let duplicated =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(duplicated, Err(ConfigError::Validation(ref message)) if message.contains("more than once")),
            "command literals must be unique",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GOLDS_LOG_LEVEL", "warn");
        env::set_var("GOLDS_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["GOLDS_LOG_LEVEL", "GOLDS_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GOLDS_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("GOLDS_SERVER_PORT", "9090");
        env::set_var("GOLDS_SCHEDULER_HOUR", "7");

        let result = (|| -> Result<(), String> {
            let (_dir, path) = write_config(
                r#"
[database]
url = "sqlite://from-file.db"

[server]
port = 8181

[scheduler]
hour = 6
minute = 30

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.server.port == 9090, "env port should win over file")?;
            ensure(config.scheduler.hour == 7, "env scheduler hour should win over file")?;
            ensure(config.scheduler.minute == 30, "file scheduler minute should be kept")?;
            Ok(())
        })();

        clear_vars(&["GOLDS_DATABASE_URL", "GOLDS_SERVER_PORT", "GOLDS_SCHEDULER_HOUR"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GOLDS_WECOM_ENCODING_AES_KEY", "too-short");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("wecom.encoding_aes_key")
            );
            ensure(has_message, "validation failure should mention wecom.encoding_aes_key")
        })();

        clear_vars(&["GOLDS_WECOM_ENCODING_AES_KEY"]);
        result
    }

    #[test]
    fn invalid_scheduler_time_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GOLDS_SCHEDULER_MINUTE", "75");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["GOLDS_SCHEDULER_MINUTE"]);

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("scheduler")),
            "out-of-range minute should fail validation",
        )
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GOLDS_SERVER_PORT", "eighty");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["GOLDS_SERVER_PORT"]);

        ensure(
            matches!(result, Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "GOLDS_SERVER_PORT"),
            "bad port should be reported as an invalid env override",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GOLDS_WECOM_CORP_SECRET", "corp-secret-value");
        env::set_var("GOLDS_WECOM_TOKEN", "callback-token-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("corp-secret-value"),
                "debug output should not contain corp secret",
            )?;
            ensure(
                !debug.contains("callback-token-value"),
                "debug output should not contain callback token",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["GOLDS_WECOM_CORP_SECRET", "GOLDS_WECOM_TOKEN"]);
        result
    }

    #[test]
    fn shipped_example_config_loads_without_wecom_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&[
            "GOLDS_WECOM_CORP_ID",
            "GOLDS_WECOM_AGENT_ID",
            "GOLDS_WECOM_CORP_SECRET",
            "GOLDS_WECOM_TOKEN",
            "GOLDS_WECOM_ENCODING_AES_KEY",
        ]);

        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../config/golds.example.toml");
        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            ..LoadOptions::default()
        })
        .map_err(|err| format!("example config should load: {err}"))?;

        ensure(config.golds.commands.len() == 3, "example lists the three built-in commands")?;
        ensure(config.wecom.corp_secret.expose_secret().is_empty(), "wecom secrets default blank")
    }
}
