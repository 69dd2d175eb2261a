//! `lorasync`: keep LoRaWAN network servers and the local entity store in step.

mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    let result = match cli.command {
        Command::Completions(args) => {
            print_completions(args.shell);
            Ok(())
        }
        command => {
            tracing::debug!(?command, "dispatching");
            commands::dispatch(command, &cli.global).await
        }
    };

    if let Err(err) = result {
        exit_with(err);
    }
}

/// `RUST_LOG` wins; otherwise `-q` and `-v` pick the level. Logs go to
/// stderr so piped output stays machine-readable.
fn init_tracing(global: &GlobalOpts) {
    let level = if global.quiet {
        "error"
    } else {
        match global.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "lorasync", &mut std::io::stdout());
}

fn exit_with(err: CliError) -> ! {
    let code = err.exit_code();
    eprintln!("{:?}", miette::Report::new(err));
    std::process::exit(code);
}
