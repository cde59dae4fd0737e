//! Harness Debugger CLI
//!
//! Diagnoses pipeline failures on the Harness platform by correlating failed
//! stage executions with the delegates that ran them.

mod commands;
mod config;
mod connectivity;
mod correlator;
mod presenter;
mod render;
mod report;
#[cfg(test)]
mod testing;

use std::process::ExitCode;

use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, GlobalArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "harness-debugger")]
#[command(about = "Harness pipeline & delegate troubleshooting tool", long_about = None)]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.globals.verbose);

    let result = match Config::from_args(&cli.globals) {
        Ok(config) => handle_command(cli.command, &config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            presenter::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays parseable in JSON mode
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "harness_debugger=debug,harness_client=debug"
    } else {
        "harness_debugger=warn,harness_client=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
