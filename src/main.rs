mod api;
mod app;
mod camera;
mod command;
mod config;
mod download;
mod encode;
mod messages;
mod session;

use app::App;
use config::Config;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting barcap barcode capture client");

    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    // Create LocalSet for !Send futures (needed for the camera worker, whose
    // frame source may hold a !Send device handle)
    let local = tokio::task::LocalSet::new();

    local
        .run_until(async move { App::new(config)?.run().await })
        .await
}
