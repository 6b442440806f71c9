//! kiln - an asset build pipeline with rule-based transforms, plugin hooks
//! and a precache manifest.

mod cli;
mod config;
mod core;
mod logger;
mod output;
mod pipeline;
mod plugin;
mod resolve;
mod rules;
mod transform;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::KilnConfig;
use transform::TransformerRegistry;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let mut config = KilnConfig::load(&cli.config)?;
    let registry = TransformerRegistry::with_builtins();

    match &cli.command {
        Commands::Build { build_args } => {
            config.apply_build_args(build_args);
            config.validate(&registry)?;
            cli::build::build_project(&config, registry).map(|_| ())
        }
        Commands::Inspect { identifier } => {
            config.validate(&registry)?;
            cli::inspect::inspect(&config, identifier)
        }
    }
}
