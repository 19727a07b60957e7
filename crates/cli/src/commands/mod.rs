pub mod config;
pub mod counter;
pub mod migrate;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// One JSON line per invocation. Counter commands also carry the identity and,
/// when the store returned one, the value.
#[derive(Debug, Default, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<i64>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        emit(0, CommandOutcome { command, status: "ok", message: message.into(), ..Default::default() })
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        emit(
            exit_code,
            CommandOutcome {
                command,
                status: "error",
                error_class: Some(error_class),
                message: message.into(),
                ..Default::default()
            },
        )
    }

    pub fn counter_success(
        command: &str,
        identity: &str,
        value: Option<i64>,
        message: impl Into<String>,
    ) -> Self {
        emit(
            0,
            CommandOutcome {
                command,
                status: "ok",
                message: message.into(),
                identity: Some(identity),
                value,
                ..Default::default()
            },
        )
    }

    pub fn counter_failure(
        command: &str,
        identity: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        emit(
            exit_code,
            CommandOutcome {
                command,
                status: "error",
                error_class: Some(error_class),
                message: message.into(),
                identity: Some(identity),
                value: None,
            },
        )
    }
}

fn emit(exit_code: u8, outcome: CommandOutcome<'_>) -> CommandResult {
    let output = serde_json::to_string(&outcome).unwrap_or_else(|error| {
        serde_json::json!({
            "command": outcome.command,
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    });
    CommandResult { exit_code, output }
}
