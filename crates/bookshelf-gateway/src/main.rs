//! Bookshelf gateway - HTTP API server for the Bookshelf backend.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bookshelf_core::Config;
use bookshelf_gateway::{GatewayBuilder, GatewayConfig};
use bookshelf_images::{CloudinaryStore, ImageStore};

#[derive(Parser)]
#[command(name = "bookshelf-gateway")]
#[command(about = "Bookshelf - book review sharing API")]
#[command(version)]
struct Cli {
    /// Path to a configuration file (JSON5)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Data directory override
    #[arg(long, env = "BOOKSHELF_STATE_DIR")]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    }
    .with_env_overrides();

    let mut gateway_config = GatewayConfig::from_config(&config);
    if let Some(port) = cli.port {
        gateway_config.port = port;
    }
    if let Some(bind) = cli.bind {
        gateway_config.bind_address = bind;
    }
    if let Some(data_dir) = cli.data_dir {
        gateway_config.data_dir = data_dir.join("data");
    }

    let mut builder = GatewayBuilder::new().with_config(gateway_config);

    if let Some(cloudinary) = &config.cloudinary {
        let mut store = CloudinaryStore::new(
            &cloudinary.cloud_name,
            &cloudinary.api_key,
            &cloudinary.api_secret,
        );
        if let Some(base_url) = &cloudinary.base_url {
            store = store.with_base_url(base_url);
        }
        tracing::info!("Using {} image hosting", store.name());
        builder = builder.with_image_store(Arc::new(store));
    } else {
        tracing::warn!("Cloudinary not configured; uploaded images will not survive restarts");
    }

    let gateway = builder.build()?;
    gateway.run().await?;

    Ok(())
}
