pub mod commands;

use clap::{Parser, Subcommand};
use golds_core::CounterOp;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "golds",
    about = "Golds operator CLI",
    long_about = "Inspect configuration, apply migrations, and operate gold counters directly.",
    after_help = "Examples:\n  golds config\n  golds migrate\n  golds counter get duxingye"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Read, increment, or reset a gold counter")]
    Counter {
        #[command(subcommand)]
        action: CounterAction,
    },
}

#[derive(Debug, Subcommand)]
enum CounterAction {
    #[command(about = "Print the current value for an identity")]
    Get { identity: String },
    #[command(about = "Increment the counter for an identity and print the new value")]
    Incr { identity: String },
    #[command(about = "Delete the counter for an identity")]
    Reset { identity: String },
}

impl CounterAction {
    fn into_parts(self) -> (CounterOp, String) {
        match self {
            Self::Get { identity } => (CounterOp::Read, identity),
            Self::Incr { identity } => (CounterOp::Increment, identity),
            Self::Reset { identity } => (CounterOp::Reset, identity),
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Counter { action } => {
            let (op, identity) = action.into_parts();
            commands::counter::run(op, &identity)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
