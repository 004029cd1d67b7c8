//! Fielder harvest prediction CLI
//!
//! Reads a JSON prediction request from the file named by the first
//! argument (or stdin) and writes the JSON report to stdout. Logs go to
//! stderr.

use std::io::Read;

use anyhow::Context;
use fielder_service::external::OpenMeteoClient;
use fielder_service::repository::InMemoryCatalog;
use fielder_service::services::{PredictionRequest, PredictionService};
use fielder_service::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Initialize tracing
    let (json_layer, text_layer) = if config.logging.json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!("Starting Fielder prediction");
    tracing::info!("Environment: {}", config.environment);

    let catalog = match config.research.catalog_path.as_deref() {
        Some(path) => InMemoryCatalog::load(path)
            .with_context(|| format!("loading research catalog {}", path))?,
        None => {
            tracing::warn!("No research catalog configured, using crop defaults only");
            InMemoryCatalog::new()
        }
    };

    let weather = OpenMeteoClient::new(&config.weather)?.with_regions(catalog.region_coordinates());
    let service = PredictionService::new(weather, catalog, &config);

    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading request {}", path))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading request from stdin")?;
            raw
        }
    };
    let request: PredictionRequest =
        serde_json::from_str(&raw).context("parsing prediction request")?;

    match service.predict(&request).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(code = e.code(), "Prediction rejected: {}", e);
            println!("{}", serde_json::to_string_pretty(&e.to_response())?);
            Err(e.into())
        }
    }
}
