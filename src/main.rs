//! News feed service: binary entrypoint.
//! Boots the Axum HTTP server: aggregator state, `/api/news`, static frontend.

use news_feed_aggregator::{build_app, metrics, AggregatorConfig};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs; `RUST_LOG` overrides the default filter. Tolerates a
/// subscriber already installed by the runtime.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_feed_aggregator=info,news=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AggregatorConfig::from_env()?;
    tracing::info!(
        api_key = cfg.has_api_key(),
        feeds = ?cfg.feeds,
        static_dir = %cfg.static_dir.display(),
        "news config loaded"
    );
    if !cfg.has_api_key() {
        tracing::info!("Set NEWSAPI_KEY to enable real NewsAPI results.");
    }

    let metrics = if metrics::debug_routes_enabled() {
        Some(metrics::Metrics::init()?)
    } else {
        None
    };

    let router = build_app(&cfg, metrics.as_ref())?;
    Ok(router.into())
}
