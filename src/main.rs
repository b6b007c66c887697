//! Multi-Perspective News Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the agent, caches, and middleware.
//!
//! The agent is constructed here and injected into the router; missing
//! credentials leave it unset and the process still serves its surface.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_perspective_analyzer::api::{self, AppState};
use news_perspective_analyzer::cache::CacheStore;
use news_perspective_analyzer::config::agent::AgentConfig;
use news_perspective_analyzer::metrics::Metrics;
use news_perspective_analyzer::{agent, digest};

const AGENT_CONFIG_PATH: &str = "config/agent.json";
const CACHE_DIR: &str = "cache";

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - ANALYZER_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("ANALYZER_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("analyzer=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let config = match AgentConfig::load_from_file(AGENT_CONFIG_PATH) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, path = AGENT_CONFIG_PATH, "agent config not loaded, using env defaults");
            AgentConfig::from_env()
        }
    };

    let agent = agent::bootstrap(&config);
    let cache = Arc::new(CacheStore::new(CACHE_DIR));

    // Refresh the daily digest in the background when absent or stale, so the
    // server starts serving immediately.
    if let Some(agent) = agent.clone() {
        let cache = Arc::clone(&cache);
        let valid = cache.read_daily().map(|r| r.is_current()).unwrap_or(false);
        if valid {
            info!("daily news cache is current, skipping refresh");
        } else {
            info!("daily news cache missing or outdated, refreshing in background");
            tokio::spawn(async move {
                digest::refresh_daily_news(&agent, &cache).await;
            });
        }
    }

    let metrics = Metrics::init();
    let state = AppState { agent, cache };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
