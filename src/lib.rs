// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregator;
pub mod api;
pub mod article;
pub mod config;
pub mod metrics;
pub mod providers;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{select_provider, Aggregator, ProviderChoice};
pub use crate::api::{create_router, AppState};
pub use crate::article::{AggregateError, AggregationResult, BackendInfo, FetchedFrom, NormalizedArticle};
pub use crate::config::AggregatorConfig;

use anyhow::Context;
use axum::Router;

/// Build the full router from an explicit config. `/metrics` is merged in
/// when a recorder handle is supplied.
pub fn build_app(cfg: &AggregatorConfig, metrics: Option<&metrics::Metrics>) -> anyhow::Result<Router> {
    let aggregator = Aggregator::new(cfg).context("building aggregator")?;
    let router = api::create_router(AppState::new(aggregator), &cfg.static_dir);
    Ok(match metrics {
        Some(m) => router.merge(m.router()),
        None => router,
    })
}

/// Build the router from the environment (`NEWS_CONFIG_PATH`, `NEWSAPI_KEY`).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AggregatorConfig::from_env()?;
    build_app(&cfg, None)
}
