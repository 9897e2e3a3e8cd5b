//! Layertree CLI - Command-line interface
//!
//! Aggregates the layer sources listed in a configuration file into one
//! layer tree and prints it as JSON.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::load::LoadArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "layertree")]
#[command(version, about = "Aggregate map-layer catalogs and WMS endpoints into a single layer tree", long_about = None)]
struct Cli {
    /// Settings file (defaults to <config dir>/layertree/config.ini)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every configured source and print the layer tree as JSON
    Load {
        /// Layer configuration file (layers.json)
        #[arg(long)]
        config: PathBuf,

        /// Only include sources available in this region
        #[arg(long)]
        region: Option<String>,

        /// Seconds to wait for all sources before giving up
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the tree on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Validate a layer configuration file and list its sources
    Validate {
        /// Layer configuration file (layers.json)
        #[arg(long)]
        config: PathBuf,
    },

    /// Print the source URLs a load would request, without fetching
    Urls {
        /// Layer configuration file (layers.json)
        #[arg(long)]
        config: PathBuf,

        /// Only include sources available in this region
        #[arg(long)]
        region: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Load {
            config,
            region,
            timeout,
            compact,
        } => commands::load::run(
            LoadArgs {
                config,
                region,
                timeout,
                compact,
            },
            cli.settings.as_deref(),
        ),
        Commands::Validate { config } => commands::validate::run(config),
        Commands::Urls { config, region } => commands::urls::run(config, region),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
