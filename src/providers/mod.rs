// src/providers/mod.rs
pub mod mock;
pub mod newsapi;
pub mod reddit;

use crate::article::{AggregateError, AggregationResult};
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// Produce normalized articles for `query` (may be empty).
    async fn fetch(&self, query: &str) -> Result<AggregationResult, AggregateError>;
    fn name(&self) -> &'static str;
}

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_requests_total", "Aggregation requests per provider.");
        describe_counter!(
            "news_upstream_errors_total",
            "Primary upstream calls that failed (status or transport)."
        );
        describe_counter!(
            "news_feed_failures_total",
            "Individual fan-out feeds that yielded nothing due to an error."
        );
        describe_histogram!("news_upstream_ms", "Upstream round-trip time in milliseconds.");
    });
}

/// `Some(s)` only when the field is present and not blank.
pub(crate) fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// Build the shared HTTP client used by all remote providers.
pub fn build_http_client(
    user_agent: &str,
    timeout: std::time::Duration,
) -> Result<reqwest::Client, AggregateError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout.min(std::time::Duration::from_secs(4)))
        .timeout(timeout)
        .build()
        .map_err(AggregateError::internal)
}

/// Tolerant field decoding: anything that does not fit `T` becomes `None`
/// instead of failing the enclosing document.
pub(crate) fn lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    use serde::Deserialize;
    let v = serde_json::Value::deserialize(d)?;
    Ok(serde_json::from_value(v).ok())
}
