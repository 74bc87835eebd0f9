#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod commands;
mod demo;
mod logging;

use clap::Parser;
use graphwire_core::Config;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "graphwire")]
#[command(author, version, about = "Drive a live object graph with path-addressed commands", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output and logs
    #[arg(long, global = true)]
    json: bool,

    /// Read settings from a JSON config file
    #[arg(long, global = true, value_name = "PATH", env = "GRAPHWIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Levels of nested nodes included in metadata snapshots
    #[arg(long, global = true, value_name = "N")]
    depth: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Split a command line into tokens
    Tokenize {
        /// The line to split
        line: String,
    },

    /// Print a metadata snapshot of the demo plant
    Describe,

    /// Dispatch encoded requests against the demo plant
    Dispatch {
        /// File holding one or more requests, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Indent each response
        #[arg(long)]
        pretty: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| miette::miette!("{}", e))?,
        None => Config::default(),
    };
    if cli.verbose > 0 {
        config = config.with_verbosity(cli.verbose);
    }
    if cli.json {
        config = config.with_json_logs(true);
    }
    if let Some(depth) = cli.depth {
        config = config.with_metadata_depth(depth);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Commands with fixed machine-readable output skip logging
    match &cli.command {
        Some(Commands::Version) | None => return commands::version::run(cli.json),
        Some(Commands::Tokenize { line }) => return commands::tokenize::run(line, cli.json),
        Some(Commands::Describe | Commands::Dispatch { .. }) => {}
    }

    logging::init(config.verbosity, config.json_logs);
    tracing::debug!(?config, "Loaded configuration");

    match &cli.command {
        Some(Commands::Describe) => commands::describe::run(&config),
        Some(Commands::Dispatch { input, pretty }) => {
            commands::dispatch::run(input, *pretty, &config)
        }
        Some(Commands::Version | Commands::Tokenize { .. }) | None => Ok(()),
    }
}
