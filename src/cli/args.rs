//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Build and test-install fonts automatically while you edit their sources
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version
    #[arg(long, action = clap::ArgAction::Version)]
    pub version: Option<bool>,

    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: autoinstall.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "autoinstall.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch sources and reinstall them after edits
    #[command(visible_alias = "w")]
    Watch {
        /// Extra sources to watch (`.ufo` or `.designspace`)
        #[arg(value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },

    /// Build and install sources once
    #[command(visible_alias = "i")]
    Install {
        /// Sources to install. If omitted, installs every configured source.
        #[arg(value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },

    /// Uninstall previously installed artifacts
    #[command(visible_alias = "u")]
    Uninstall {
        /// Sources whose artifacts to remove
        #[arg(value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
        paths: Vec<PathBuf>,

        /// Remove every recorded artifact
        #[arg(short, long, conflicts_with = "paths")]
        all: bool,
    },

    /// List installed artifacts
    #[command(visible_alias = "s")]
    Status,

    /// Check a design space for incompatible masters
    #[command(visible_alias = "c")]
    Check {
        /// The `.designspace` document
        #[arg(value_name = "DESIGNSPACE", value_hint = clap::ValueHint::FilePath)]
        designspace: PathBuf,

        /// Write the corrections back to the masters
        #[arg(short, long)]
        fix: bool,
    },

    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Extra source paths given on the command line.
    pub fn source_args(&self) -> &[PathBuf] {
        match &self.command {
            Commands::Watch { paths } | Commands::Install { paths } => paths,
            _ => &[],
        }
    }
}
