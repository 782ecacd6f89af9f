//! Product price service.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /products/{id}/price
//!        │
//!        ▼
//!   ┌──────────┐   ┌──────────────┐   ┌─────────────────┐   ┌─────────────────┐
//!   │   http   │──▶│ PriceService │──▶│ CircuitBreaker  │──▶│ HttpPriceClient │──▶ price backend
//!   │  server  │   │  + Catalog   │   │  ("get_price")  │   │   (deadline)    │
//!   └──────────┘   └──────┬───────┘   └────────┬────────┘   └─────────────────┘
//!                         │   error / open     │
//!                         ◀────────────────────┘
//!                   stored product price (fallback)
//! ```

use std::path::PathBuf;

use clap::Parser;

use price_service::config::{load_config, ServiceConfig};
use price_service::lifecycle::startup;
use price_service::observability::logging;

#[derive(Parser)]
#[command(name = "price-service")]
#[command(about = "Product price service with circuit breaker protected lookups", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "PRICE_SERVICE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!("price-service v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        tracing::info!(path = %path.display(), "Loaded configuration file");
    }

    startup::run(config).await
}
