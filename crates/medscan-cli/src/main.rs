use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medscan_application::ImageStore;
use medscan_core::image::{ImageId, MedicalImage};
use medscan_infrastructure::{ApiConfig, HttpImageTransport};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "medscan")]
#[command(about = "MedScan CLI - upload and review medical image analysis jobs", long_about = None)]
struct Cli {
    /// Path to a config.toml (defaults to ~/.config/medscan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print raw JSON records instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List uploaded images
    List,
    /// Show a single image and its analysis status
    Show { id: ImageId },
    /// Upload an image file (jpg, jpeg, png, dcm, dicom)
    Upload {
        path: PathBuf,
        /// Title stored with the image (defaults to the file name without extension)
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an image
    Delete { id: ImageId },
}

fn init_tracing() {
    // stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ApiConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(base_url = %config.base_url, "Using MedScan API");

    let transport = HttpImageTransport::<MedicalImage>::new(&config)?;
    let store = ImageStore::new(Arc::new(transport));

    match cli.command {
        Commands::List => commands::list::run(&store, cli.json).await?,
        Commands::Show { id } => commands::show::run(&store, &id, cli.json).await?,
        Commands::Upload {
            path,
            title,
            description,
        } => commands::upload::run(&store, &path, title, description).await?,
        Commands::Delete { id } => commands::delete::run(&store, &id).await?,
    }

    Ok(())
}
