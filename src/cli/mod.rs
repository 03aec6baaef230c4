//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{BusinessesCommand, FormCommand, JobsCommand, TriggerCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Multi-tenant pipeline runner for form events and triggers
#[derive(Debug, Parser, Clone)]
#[command(name = "bizops")]
#[command(version)]
#[command(about = "Run configured business pipelines for form events and triggers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory containing businesses/ and pipelines/
    #[arg(long, global = true, env = "BIZOPS_CONFIG_DIR", default_value = "./config")]
    pub config_dir: PathBuf,

    /// Job database path
    #[arg(long, global = true, env = "BIZOPS_DB")]
    pub db: Option<PathBuf>,

    /// Keep jobs in memory instead of the database
    #[arg(long, global = true)]
    pub memory: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the pipeline for a form submission
    Form(FormCommand),

    /// Run the pipeline mapped to a trigger
    Trigger(TriggerCommand),

    /// Validate configuration
    Validate(ValidateCommand),

    /// List configured businesses
    Businesses(BusinessesCommand),

    /// Show job history
    Jobs(JobsCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
