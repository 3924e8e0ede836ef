// src/aggregator.rs
//! Request dispatch: picks an adapter per call and wraps its outcome.

use metrics::counter;

use crate::article::{AggregateError, AggregationResult};
use crate::config::AggregatorConfig;
use crate::providers::mock::{MockProvider, SampleArticle, SAMPLE_CATALOG};
use crate::providers::newsapi::NewsApiProvider;
use crate::providers::reddit::RedditProvider;
use crate::providers::{build_http_client, ensure_metrics_described, NewsProvider};

/// Provider selector value that routes to Reddit.
pub const REDDIT_SELECTOR: &str = "reddit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChoice {
    Mock,
    NewsApi,
    RedditSearch,
    RedditHot,
}

/// Selection policy, in priority order:
/// 1. `provider=reddit` → search when `query` is non-empty, else the hot fan-out
/// 2. no API key → sample catalog
/// 3. otherwise → NewsAPI
pub fn select_provider(selector: &str, query: &str, has_api_key: bool) -> ProviderChoice {
    if selector == REDDIT_SELECTOR {
        if query.is_empty() {
            ProviderChoice::RedditHot
        } else {
            ProviderChoice::RedditSearch
        }
    } else if !has_api_key {
        ProviderChoice::Mock
    } else {
        ProviderChoice::NewsApi
    }
}

/// Stateless across calls; every request recomputes from scratch.
pub struct Aggregator {
    mock: MockProvider,
    newsapi: Option<NewsApiProvider>,
    reddit: RedditProvider,
}

impl Aggregator {
    pub fn new(cfg: &AggregatorConfig) -> Result<Self, AggregateError> {
        Self::with_catalog(cfg, SAMPLE_CATALOG.to_vec())
    }

    pub fn with_catalog(
        cfg: &AggregatorConfig,
        catalog: Vec<SampleArticle>,
    ) -> Result<Self, AggregateError> {
        ensure_metrics_described();
        let http = build_http_client(&cfg.user_agent, cfg.request_timeout)?;
        let newsapi = cfg
            .newsapi_key
            .as_ref()
            .map(|key| NewsApiProvider::new(http.clone(), cfg.newsapi_base_url.clone(), key.clone()));
        Ok(Self {
            mock: MockProvider::new(catalog),
            newsapi,
            reddit: RedditProvider::new(http, cfg.reddit_base_url.clone(), cfg.feeds.clone()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.newsapi.is_some()
    }

    fn provider_for(&self, choice: ProviderChoice) -> &dyn NewsProvider {
        match choice {
            ProviderChoice::RedditSearch | ProviderChoice::RedditHot => &self.reddit,
            ProviderChoice::Mock => &self.mock,
            ProviderChoice::NewsApi => match &self.newsapi {
                Some(newsapi) => newsapi,
                // unreachable: NewsApi is only selected when has_api_key() holds
                None => &self.mock,
            },
        }
    }

    pub async fn aggregate(
        &self,
        query: &str,
        selector: &str,
    ) -> Result<AggregationResult, AggregateError> {
        let choice = select_provider(selector, query, self.has_api_key());
        let provider = self.provider_for(choice);
        counter!("news_requests_total", "provider" => provider.name()).increment(1);

        let res = provider.fetch(query).await;
        match &res {
            Ok(r) => tracing::info!(
                target: "news",
                provider = provider.name(),
                ?choice,
                articles = r.articles.len(),
                "aggregated"
            ),
            Err(e) => tracing::warn!(
                target: "news",
                provider = provider.name(),
                ?choice,
                error = %e,
                "aggregation failed"
            ),
        }
        res
    }
}
