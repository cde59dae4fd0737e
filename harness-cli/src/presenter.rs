//! Presenter
//!
//! Routes user-facing output. In text mode messages are decorated and go to
//! stdout; in JSON mode stdout carries nothing but the JSON document and every
//! diagnostic goes to stderr undecorated.

use std::fmt::Display;

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::*;
use serde::Serialize;

/// Output format selected with `--output`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored tables and messages
    #[default]
    Text,
    /// Machine readable JSON on stdout
    Json,
}

/// Writes results and diagnostics for one output format
#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    format: OutputFormat,
}

impl Presenter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Progress or context message
    pub fn info(&self, message: impl Display) {
        if self.is_json() {
            eprintln!("{}", message);
        } else {
            println!("{} {}", "ℹ".cyan(), message.to_string().cyan());
        }
    }

    pub fn success(&self, message: impl Display) {
        if self.is_json() {
            eprintln!("{}", message);
        } else {
            println!("{} {}", "✓".green(), message.to_string().green());
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.is_json() {
            eprintln!("warning: {}", message);
        } else {
            println!("{} {}", "⚠".yellow(), message.to_string().yellow());
        }
    }

    /// Failure notice that is part of the result (e.g. "found 3 failed runs")
    pub fn alert(&self, message: impl Display) {
        if self.is_json() {
            eprintln!("{}", message);
        } else {
            println!("{} {}", "✗".red(), message.to_string().red().bold());
        }
    }

    /// Serialize `value` as pretty JSON on stdout
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", rendered);
        Ok(())
    }
}

/// Print a fatal diagnostic to stderr
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "✗ Error:".red().bold(), err);
}
