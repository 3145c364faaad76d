//! Calc Agents - Main Entry Point

use calc_agents::config::ServiceConfig;
use calc_agents::observability::init_default_logging;
use calc_agents::App;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tokio::signal;
use tracing::{error, info, warn};

/// Arithmetic task service with a fixed pool of evaluating agents
#[derive(Parser)]
#[command(name = "calc-agents")]
#[command(about = "Arithmetic task service with a fixed pool of evaluating agents")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the worker pool and HTTP API
    Run,
    /// Validate configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,
    },
}

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["calc-agents.toml", "config/calc-agents.toml"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    info!("Starting calc-agents v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_service(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Application shutdown complete");
}

fn load_configuration(
    config_path: Option<&Path>,
) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            ServiceConfig::load_from_file(path)?
        }
        None => match DEFAULT_CONFIG_PATHS.iter().map(Path::new).find(|p| p.exists()) {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                ServiceConfig::load_from_file(path)?
            }
            None => {
                warn!("No configuration file found, using defaults");
                ServiceConfig::default()
            }
        },
    };

    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

async fn run_service(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Install handlers before serving so an early signal is not lost
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    let app = App::start(config)?;

    let shutdown = async move {
        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    app.serve(shutdown).await?;
    Ok(())
}

fn handle_config_command(
    config: &ServiceConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
