use std::process::ExitCode;

fn main() -> ExitCode {
    golds_cli::run()
}
