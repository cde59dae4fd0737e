//! Configuration module
//!
//! Global CLI flags (with environment fallbacks) and the configuration built
//! from them once at startup.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use harness_client::ClientConfig;
use harness_client::config::DEFAULT_BASE_URL;

use crate::presenter::OutputFormat;

/// Flags accepted by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Harness API key
    #[arg(long, env = "HARNESS_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Harness account ID
    #[arg(long = "account", env = "HARNESS_ACCOUNT_ID", global = true)]
    pub account_id: Option<String>,

    /// Harness organization ID
    #[arg(long = "org", env = "HARNESS_ORG_ID", global = true)]
    pub org_id: Option<String>,

    /// Harness project ID
    #[arg(long = "project", env = "HARNESS_PROJECT_ID", global = true)]
    pub project_id: Option<String>,

    /// Platform gateway URL
    #[arg(long, env = "HARNESS_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    pub timeout: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform connection settings
    pub client: ClientConfig,

    /// Selected output format
    pub output: OutputFormat,
}

impl Config {
    /// Build and validate the configuration
    ///
    /// Missing credentials are a configuration error.
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let client = ClientConfig::new(
            args.api_key.clone().unwrap_or_default(),
            args.account_id.clone().unwrap_or_default(),
        )
        .with_scope(args.org_id.clone(), args.project_id.clone())
        .with_base_url(args.base_url.clone())
        .with_timeout(Duration::from_secs(args.timeout));

        client.validate()?;

        Ok(Self {
            client,
            output: args.output,
        })
    }
}
