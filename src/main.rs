//! # Protected Words Sync
//!
//! Runs the protected-word refresh loop against a search cluster until
//! Ctrl-C. Settings are passed as `key=value` arguments, the cluster address
//! through `SEARCH_BACKEND_URL`.

use protected_words::{HttpWordStore, Settings, WordSync};
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let backend_url = std::env::var("SEARCH_BACKEND_URL")
        .unwrap_or_else(|_| "http://localhost:9200".to_string());
    let settings = Settings::from_args(std::env::args().skip(1));

    let store = Arc::new(HttpWordStore::new(backend_url.as_str(), REQUEST_TIMEOUT)?);
    let sync = WordSync::from_settings(&settings, store)?;

    log::info!(
        "Syncing protected words from {} index `{}`",
        backend_url,
        sync.refresh_loop().config().index
    );
    sync.start()?;

    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown signal received");

    if !sync.stop().await {
        log::warn!("Refresh task still running at exit");
    }
    log::info!("{} protected words cached at exit", sync.cache().len());

    Ok(())
}
