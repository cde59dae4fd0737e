//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod connector;
mod delegate;
mod pipeline;

pub use connector::ConnectorCommands;
pub use delegate::DelegateCommands;
pub use pipeline::PipelineCommands;

use anyhow::Result;
use clap::Subcommand;
use harness_client::HarnessClient;
use tracing::debug;

use crate::config::Config;
use crate::presenter::Presenter;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Delegate-related commands
    Delegate {
        #[command(subcommand)]
        command: DelegateCommands,
    },
    /// Pipeline-related commands
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Connector-related commands
    Connector {
        #[command(subcommand)]
        command: ConnectorCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = HarnessClient::new(config.client.clone())?;
    let presenter = Presenter::new(config.output);

    match command {
        Commands::Delegate { command } => {
            delegate::handle_delegate_command(command, &client, &presenter).await
        }
        Commands::Pipeline { command } => {
            pipeline::handle_pipeline_command(command, &client, &presenter).await
        }
        Commands::Connector { command } => {
            connector::handle_connector_command(command, &client, &presenter).await
        }
    }
}

/// Treat a platform-reported failure on a listing as "no data"
///
/// Transport and HTTP errors still propagate.
pub(crate) fn or_empty<T: Default>(
    result: harness_client::Result<T>,
    presenter: &Presenter,
    what: &str,
) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_application_error() => {
            debug!("Treating {} as empty: {}", what, e);
            presenter.warn(format!("Could not retrieve {}: {}", what, e));
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}
