//! Delegate command handlers
//!
//! Handles listing delegates, showing one delegate, generating connectivity
//! checks and (via the pipeline module) correlating pipeline failures.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use harness_client::PlatformApi;
use harness_core::domain::connectivity::ConnectivityPlan;
use harness_core::domain::delegate::Delegate;

use super::or_empty;
use super::pipeline::{CheckArgs, check_pipeline};
use crate::connectivity::build_plan;
use crate::presenter::Presenter;
use crate::render::{delegate_details, delegate_table};

/// Delegate subcommands
#[derive(Subcommand)]
pub enum DelegateCommands {
    /// List all delegates
    List,
    /// Get detailed information about a delegate
    Info {
        /// Delegate ID
        delegate_id: String,
    },
    /// Generate commands to test delegate connectivity
    TestConnectivity {
        /// Delegate ID
        delegate_id: String,

        /// URLs to test (defaults to common services)
        #[arg(long, num_args = 1..)]
        urls: Vec<String>,
    },
    /// Check delegate usage in failed pipeline stages
    CheckPipeline(CheckArgs),
}

/// Handle delegate commands
///
/// Routes delegate subcommands to their respective handlers.
pub async fn handle_delegate_command(
    command: DelegateCommands,
    platform: &dyn PlatformApi,
    presenter: &Presenter,
) -> Result<()> {
    match command {
        DelegateCommands::List => list_delegates(platform, presenter).await,
        DelegateCommands::Info { delegate_id } => {
            show_delegate(platform, presenter, &delegate_id).await
        }
        DelegateCommands::TestConnectivity { delegate_id, urls } => {
            test_connectivity(platform, presenter, &delegate_id, &urls).await
        }
        DelegateCommands::CheckPipeline(args) => check_pipeline(platform, presenter, &args).await,
    }
}

/// List all delegates
async fn list_delegates(platform: &dyn PlatformApi, presenter: &Presenter) -> Result<()> {
    presenter.info("Fetching delegates information...");
    let delegates = or_empty(platform.list_delegates().await, presenter, "delegates")?;

    if delegates.is_empty() {
        presenter.warn("No delegates found");
        if presenter.is_json() {
            presenter.json(&delegates)?;
        }
        return Ok(());
    }

    if presenter.is_json() {
        return presenter.json(&delegates);
    }

    let mut sorted: Vec<&Delegate> = delegates.values().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    println!();
    println!(
        "{}",
        format!("Found {} delegate(s):", delegates.len()).bold()
    );
    println!("{}", delegate_table(sorted).render());

    Ok(())
}

/// Fetch a delegate, turning "absent" into a not-found diagnostic
async fn fetch_delegate(platform: &dyn PlatformApi, delegate_id: &str) -> Result<Delegate> {
    match platform.get_delegate(delegate_id).await {
        Ok(delegate) => Ok(delegate),
        Err(e) if e.is_not_found() => {
            bail!("Could not find delegate with ID: {}", delegate_id)
        }
        Err(e) if e.is_application_error() => {
            bail!("Could not find delegate with ID: {} ({})", delegate_id, e)
        }
        Err(e) => Err(e.into()),
    }
}

/// Show detailed information about a delegate
async fn show_delegate(
    platform: &dyn PlatformApi,
    presenter: &Presenter,
    delegate_id: &str,
) -> Result<()> {
    let delegate = fetch_delegate(platform, delegate_id).await?;

    if presenter.is_json() {
        return presenter.json(&delegate);
    }

    println!();
    println!("{}", "Delegate Information:".cyan().bold());
    println!("{}", delegate_details(&delegate));

    Ok(())
}

/// Print connectivity checks to run on the delegate host
async fn test_connectivity(
    platform: &dyn PlatformApi,
    presenter: &Presenter,
    delegate_id: &str,
    urls: &[String],
) -> Result<()> {
    let delegate = fetch_delegate(platform, delegate_id).await?;
    let plan = build_plan(delegate, urls)?;

    if presenter.is_json() {
        return presenter.json(&plan);
    }

    print_connectivity_plan(&plan);
    Ok(())
}

fn print_connectivity_plan(plan: &ConnectivityPlan) {
    let delegate = &plan.delegate;

    println!();
    println!(
        "{} {} ({})",
        "Delegate:".cyan(),
        delegate.name.bold(),
        delegate.id
    );
    println!("{} {}", "Hostname:".cyan(), delegate.hostname);
    println!("{} {}", "IP:".cyan(), delegate.ip);

    println!();
    println!("{}", "Connectivity Test Commands".cyan().bold());
    println!(
        "{}",
        "Run these commands on the delegate machine to test connectivity:".yellow()
    );
    println!("{}", "─".repeat(62).dimmed());

    for test in &plan.connectivity_tests {
        println!();
        println!("  {} {}", "▸".cyan(), test.url.bold());
        println!("    Hostname:     {}", test.hostname);
        println!("    Port:         {}", test.port);
        println!("    Network test: {}", test.network_command.green());
        println!("    HTTP test:    {}", test.http_command.green());
    }

    println!();
    println!("{}", "Instructions:".cyan().bold());
    println!("  1. SSH into the delegate machine");
    println!("  2. Run the above commands to test connectivity");
    println!("  3. For network tests, look for 'Connection to [host] [port] succeeded!'");
    println!("  4. For HTTP tests, a response code of 200 indicates success");
}
