//! # Meetsync Main Entry Point
//!
//! Loads configuration, initializes logging, builds the service graph and
//! runs the background loops.

use meetsync::{app::App, config::ConfigLoader, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    logging::init_subscriber(&config);

    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!(profile = %config.profile, config = %redacted_json, "Loaded configuration");
    }

    let app = App::build(&config).await?;
    app.run().await
}
