mod api;
mod config;
mod engine;
mod error;
mod filters;
mod format;
mod loader;
mod state;
mod types;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;
use crate::state::QuoteStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Quote store + initial load ---
    let store = QuoteStore::new(cfg.raw_quotes_source.clone(), cfg.top_bets_source.clone());

    let quotes = store.quotes().await?;
    info!("Bootstrap complete: {} quotes cached", quotes.len());

    match store.value_bets().await {
        Ok(bets) => info!(
            "Value-bet table ready: {} rows (precomputed={})",
            bets.len(),
            store.precomputed_loaded(),
        ),
        // The table is rebuilt on demand; a failed bootstrap build is not fatal.
        Err(e) => warn!("Value-bet table unavailable at startup: {e}"),
    }

    // --- HTTP API server ---
    let api_state = ApiState { store };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
