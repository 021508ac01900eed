//! autoinstall - Build and test-install fonts while you edit their sources.

mod actor;
mod build;
mod cli;
mod compat;
mod config;
mod control;
mod core;
mod engine;
mod logger;
mod registry;
mod schedule;
mod ufo;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{AutoInstallConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();
    logger::set_verbose(cli.verbose);

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(AutoInstallConfig::load(&cli)?);

    match &cli.command {
        Commands::Watch { .. } => cli::watch::watch(&config),
        Commands::Install { paths } => cli::install::install(&config, paths),
        Commands::Uninstall { paths, all } => cli::install::uninstall(&config, paths, *all),
        Commands::Status => cli::status::status(&config),
        Commands::Check { designspace, fix } => cli::check::check(&config, designspace, *fix),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
