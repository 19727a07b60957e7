use std::collections::HashMap;
use std::sync::Arc;

use golds_core::config::CommandConfig;
use golds_core::{CounterError, CounterOp};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::counters::GoldCounters;

/// Reply for a read of a counter that has never been set.
pub const NO_DATA_REPLY: &str = "no data";

/// Period summaries that are accepted as commands but have no behavior yet.
pub const RESERVED_PERIOD_COMMANDS: [&str; 4] = ["/today", "/yesterday", "/week", "/month"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command")]
    UnknownCommand,
    #[error(transparent)]
    Counter(#[from] CounterError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandAction {
    pub identity: String,
    pub op: CounterOp,
    /// Only used by `Reset`.
    pub reply: Option<String>,
}

impl CommandAction {
    pub fn read(identity: impl Into<String>) -> Self {
        Self { identity: identity.into(), op: CounterOp::Read, reply: None }
    }

    pub fn increment(identity: impl Into<String>) -> Self {
        Self { identity: identity.into(), op: CounterOp::Increment, reply: None }
    }

    pub fn reset(identity: impl Into<String>, reply: impl Into<String>) -> Self {
        Self { identity: identity.into(), op: CounterOp::Reset, reply: Some(reply.into()) }
    }
}

/// Exact-match table from command text to counter action.
#[derive(Clone, Debug, Default)]
pub struct CommandTable {
    entries: HashMap<String, CommandAction>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert("/杜行烨", CommandAction::read("duxingye"));
        table.insert("/杜行逸", CommandAction::read("duxingyi"));
        table.insert("/reset", CommandAction::reset("duxingye", "杜行烨数据清零"));
        table
    }

    /// An empty configuration falls back to [`CommandTable::builtin`].
    pub fn from_config(commands: &[CommandConfig]) -> Self {
        if commands.is_empty() {
            return Self::builtin();
        }

        let mut table = Self::new();
        for entry in commands {
            let reply = match entry.op {
                CounterOp::Reset => Some(
                    entry.reply.clone().unwrap_or_else(|| format!("{} counter reset", entry.identity)),
                ),
                CounterOp::Read | CounterOp::Increment => None,
            };
            table.insert(
                entry.command.trim(),
                CommandAction { identity: entry.identity.clone(), op: entry.op, reply },
            );
        }
        table
    }

    pub fn insert(
        &mut self,
        command: impl Into<String>,
        action: CommandAction,
    ) -> Option<CommandAction> {
        self.entries.insert(command.into(), action)
    }

    pub fn get(&self, command: &str) -> Option<&CommandAction> {
        self.entries.get(command)
    }

    pub fn commands(&self) -> Vec<&str> {
        let mut commands: Vec<_> = self.entries.keys().map(String::as_str).collect();
        commands.sort_unstable();
        commands
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn is_reserved_command(command: &str) -> bool {
    RESERVED_PERIOD_COMMANDS.contains(&command)
}

/// Maps text content to a reply. Every input yields a non-empty reply; failures
/// are rendered as their error text.
pub struct CommandRouter {
    table: CommandTable,
    counters: Arc<GoldCounters>,
}

impl CommandRouter {
    pub fn new(table: CommandTable, counters: Arc<GoldCounters>) -> Self {
        Self { table, counters }
    }

    pub async fn route(&self, content: &str) -> String {
        let command = content.trim();
        let outcome = self.execute(command).await;
        if let Err(error) = &outcome {
            debug!(event_name = "wecom.command.rejected", command, error = %error, "command failed");
        }
        render_reply(outcome)
    }

    async fn execute(&self, command: &str) -> Result<Option<String>, CommandError> {
        if !command.starts_with('/') {
            return Err(CommandError::UnknownCommand);
        }

        let Some(action) = self.table.get(command) else {
            if is_reserved_command(command) {
                info!(event_name = "wecom.command.reserved", command, "period command not available");
            }
            return Err(CommandError::UnknownCommand);
        };

        match action.op {
            CounterOp::Read => match self.counters.read(&action.identity).await {
                Ok(value) => Ok(Some(value.to_string())),
                Err(error) if error.is_not_found() => Ok(None),
                Err(error) => {
                    warn!(identity = %action.identity, error = %error, "counter read failed");
                    Err(error.into())
                }
            },
            CounterOp::Increment => {
                let value = self.counters.increment(&action.identity).await?;
                Ok(Some(value.to_string()))
            }
            CounterOp::Reset => {
                self.counters.reset(&action.identity).await?;
                Ok(action.reply.clone())
            }
        }
    }
}

fn render_reply(outcome: Result<Option<String>, CommandError>) -> String {
    match outcome {
        Ok(Some(reply)) if !reply.is_empty() => reply,
        Ok(_) => NO_DATA_REPLY.to_owned(),
        Err(error) => error.to_string(),
    }
}
