use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use treelox::{Lox, Outcome};

const EXIT_STATIC_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;

/// Run a script, or start an interactive prompt when no script is given.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Script to execute.
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let mut lox = Lox::new();

    match cli.script {
        Some(path) => match lox.run_file(&path) {
            Ok(Outcome::Success) => ExitCode::SUCCESS,
            Ok(Outcome::StaticError) => ExitCode::from(EXIT_STATIC_ERROR),
            Ok(Outcome::RuntimeError) => ExitCode::from(EXIT_RUNTIME_ERROR),
            Err(err) => {
                eprintln!("Could not read '{}': {}", path.display(), err);
                ExitCode::from(EXIT_STATIC_ERROR)
            }
        },
        None => {
            let stdin = io::stdin();
            let prompt: Box<dyn io::Write> = if stdin.is_terminal() {
                Box::new(io::stdout())
            } else {
                Box::new(io::sink())
            };

            match lox.run_prompt(stdin.lock(), prompt) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("{}", err);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Logging is off unless `RUST_LOG` is set, e.g. `RUST_LOG=treelox=trace`.
/// Logs go to stderr so they never mix with program output.
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}
