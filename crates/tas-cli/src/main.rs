mod locate;
mod offices;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::locate::LocateArgs;
use crate::offices::OfficesCommands;

#[derive(Debug, Parser)]
#[command(name = "tas-cli")]
#[command(about = "Office directory and nearest-branch tooling")]
struct Cli {
    /// Offices file to use instead of `TAS_OFFICES_PATH`
    #[arg(long, global = true)]
    offices: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect the configured offices
    Offices {
        #[command(subcommand)]
        command: OfficesCommands,
    },
    /// Run the nearest-branch resolver against a fixed location
    Locate(LocateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = tas_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let offices_path = cli.offices.unwrap_or_else(|| config.offices_path.clone());

    match cli.command {
        Some(Commands::Offices { command }) => {
            offices::run_offices(&command, &offices_path, &config.whatsapp_country_code)?;
        }
        Some(Commands::Locate(args)) => {
            let (directory, _) = offices::load_directory(&offices_path)?;
            let options = tas_locator::PositionOptions::from_app_config(&config);
            locate::run_locate(directory, options, &args).await?;
        }
        None => println!("nothing to do; see `tas-cli --help`"),
    }

    Ok(())
}
