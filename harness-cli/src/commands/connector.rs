//! Connector command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use harness_client::PlatformApi;

use super::or_empty;
use crate::presenter::Presenter;
use crate::render::connector_table;

/// Connector subcommands
#[derive(Subcommand)]
pub enum ConnectorCommands {
    /// List all connectors
    List,
    /// Find connectors using a specific delegate selector
    ByDelegate {
        /// Delegate selector
        selector: String,
    },
}

/// Handle connector commands
pub async fn handle_connector_command(
    command: ConnectorCommands,
    platform: &dyn PlatformApi,
    presenter: &Presenter,
) -> Result<()> {
    match command {
        ConnectorCommands::List => list_connectors(platform, presenter, None).await,
        ConnectorCommands::ByDelegate { selector } => {
            list_connectors(platform, presenter, Some(&selector)).await
        }
    }
}

/// List connectors, optionally only those pinned to `selector`
async fn list_connectors(
    platform: &dyn PlatformApi,
    presenter: &Presenter,
    selector: Option<&str>,
) -> Result<()> {
    let connectors = or_empty(
        platform.list_connectors(selector).await,
        presenter,
        "connectors",
    )?;

    if connectors.is_empty() {
        match selector {
            Some(selector) => presenter.warn(format!(
                "No connectors found using delegate selector '{}'",
                selector
            )),
            None => presenter.warn("No connectors found"),
        }
        if presenter.is_json() {
            presenter.json(&connectors)?;
        }
        return Ok(());
    }

    if presenter.is_json() {
        return presenter.json(&connectors);
    }

    let heading = match selector {
        Some(selector) => format!(
            "Found {} connector(s) using delegate selector '{}':",
            connectors.len(),
            selector
        ),
        None => format!("Found {} connector(s):", connectors.len()),
    };

    println!();
    println!("{}", heading.bold());
    println!("{}", connector_table(&connectors).render());

    Ok(())
}
