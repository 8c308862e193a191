//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::Parser;

use commands::Commands;

/// Version string including the commit it was built from
const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("VERGEN_GIT_SHA"), ")");

/// Flashpack - packaging pipeline for flashable Android installer archives
///
/// Invoked bare, runs the full packaging pipeline in the current
/// directory. The only recognized subcommand provisions the NDK.
#[derive(Parser, Debug)]
#[command(name = "flashpack")]
#[command(version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let project_dir = std::env::current_dir()?;
        match self.command {
            None => commands::build::execute(&project_dir).await,
            Some(Commands::Ndk) => commands::ndk::execute(&project_dir).await,
        }
    }
}
