//! # lakehold-cli
//!
//! Command-line interface for Lakehold lakes.
//!
//! ## Commands
//!
//! - `lakehold attach` - Attach (creating if needed) a lake whose metadata
//!   lives on the local filesystem, and print its resolved configuration
//!
//! ## Configuration
//!
//! - `LAKEHOLD_FORMAT` - Output format (`text`, `json`, `table`)
//! - `LAKEHOLD_LOG_FORMAT` - Log format (`pretty`, `compact`, `json`)
//! - `RUST_LOG` - Log filter (default: `warn`)

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;

use clap::{Parser, Subcommand};

use lakehold_core::LogFormat;

/// Lakehold CLI - lake bootstrap command-line interface.
#[derive(Debug, Parser)]
#[command(name = "lakehold")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, env = "LAKEHOLD_FORMAT", default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Log format.
    #[arg(long, env = "LAKEHOLD_LOG_FORMAT", default_value = "compact", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            format: self.format.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Attach a lake, creating it if it does not exist yet.
    Attach(commands::attach::AttachArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// Log format selectable on the command line.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormatArg {
    /// Multi-line human-readable logs.
    Pretty,
    /// Single-line logs.
    #[default]
    Compact,
    /// JSON logs.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Output format.
    pub format: OutputFormat,
}
