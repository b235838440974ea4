//! beamdrop CLI - launches the BeamDrop window and backend
//!
//! - `run` (default): serve the UI, push time events, answer service calls
//! - `services`: list what a page can call
//! - `config`: inspect or create the config file

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use beamdrop_core::BeamdropConfig;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use commands::config::{ConfigArgs, ConfigCommands};
use commands::run::RunArgs;
use commands::services::ServicesArgs;
use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "beamdrop",
    author,
    version,
    about = "Desktop bridge: a web UI window backed by Rust services and events"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: ~/.beamdrop/config.toml)
    #[arg(long, short = 'c', global = true, env = "BEAMDROP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the application (default)
    Run(RunArgs),
    /// List callable services and their signatures
    Services(ServicesArgs),
    /// Manage beamdrop configuration (path, show, init)
    Config(ConfigArgs),
}

fn load_config(path: &std::path::Path) -> Result<BeamdropConfig> {
    if path.exists() {
        Ok(BeamdropConfig::load_from(path)?)
    } else {
        Ok(BeamdropConfig::default())
    }
}

async fn dispatch(command: Commands, path: PathBuf, config: BeamdropConfig) -> Result<()> {
    match command {
        Commands::Run(args) => commands::run::run(args, config).await,
        Commands::Services(args) => commands::services::run_services(args, config),
        Commands::Config(args) => commands::config::run_config(args, &path, &config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let path = cli.config.unwrap_or_else(BeamdropConfig::config_path);
    let loaded = load_config(&path);

    let level = loaded
        .as_ref()
        .map(|config| config.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    if let Err(err) = init_tracing(&TracingConfig {
        debug: cli.debug,
        level,
    }) {
        eprintln!("Failed to initialize logging: {:#}", err);
    }

    let command = cli.command.unwrap_or(Commands::Run(RunArgs::default()));
    let outcome = match loaded {
        Ok(config) => dispatch(command, path, config).await,
        // `config path` and `config init` must work even with a broken file
        Err(err) => match command {
            Commands::Config(args) if !matches!(args.command, ConfigCommands::Show) => {
                tracing::warn!("{:#}", err);
                commands::config::run_config(args, &path, &BeamdropConfig::default())
            }
            _ => Err(err),
        },
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
