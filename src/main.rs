//! Home price prediction server.
//!
//! Loads the model artifacts, then serves predictions over HTTP until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use home_price_inference::config::{default_config_template, Config};
use home_price_inference::{server, ArtifactStore, PriceEstimator};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "home-price-server")]
#[command(about = "HTTP server for home price prediction")]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Interface to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(long, short)]
    port: Option<u16>,

    /// Column schema file (overrides config)
    #[arg(long)]
    columns: Option<PathBuf>,

    /// Model file (overrides config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Print a default configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

impl Args {
    fn into_config(self) -> home_price_inference::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(columns) = self.columns {
            config.artifacts.columns = columns;
        }
        if let Some(model) = self.model {
            config.artifacts.model = model;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.generate_config {
        println!("{}", default_config_template());
        return;
    }

    if let Err(e) = run(args).await {
        error!("Failed to start the server: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> home_price_inference::Result<()> {
    info!("Starting home price prediction server...");
    let config = args.into_config()?;

    // Serving never starts without artifacts
    let store = ArtifactStore::new(config.artifacts.clone(), config.schema.clone());
    store.load().context("failed to load artifacts")?;

    let estimator = Arc::new(PriceEstimator::new(
        Arc::new(store),
        config.estimator.clone(),
    ));
    info!(
        "Unknown location policy: {:?}",
        config.estimator.unknown_location
    );

    let addr = config.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    server::serve(listener, estimator, shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
