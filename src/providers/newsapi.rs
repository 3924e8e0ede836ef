// src/providers/newsapi.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Url;
use serde::Deserialize;

use crate::article::{
    now_iso, AggregateError, AggregationResult, BackendInfo, FetchedFrom, NormalizedArticle,
};
use crate::config::PAGE_SIZE;
use crate::providers::{lenient, NewsProvider};

const TOP_HEADLINES_PATH: &str = "/v2/top-headlines";
const REDACTED: &str = "***";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopHeadlines {
    #[serde(default, deserialize_with = "lenient")]
    total_results: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    articles: Option<Vec<serde_json::Value>>,
}

impl TopHeadlines {
    /// Each entry decodes on its own; one that is not an object maps to an empty item.
    fn into_items(self) -> Vec<Item> {
        self.articles
            .unwrap_or_default()
            .into_iter()
            .map(|v| serde_json::from_value::<Item>(v).unwrap_or_default())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url_to_image: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    source: Option<ItemSource>,
    #[serde(default, deserialize_with = "lenient")]
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemSource {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
}

impl Item {
    fn into_article(self) -> NormalizedArticle {
        NormalizedArticle {
            id: None,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image: self.url_to_image.unwrap_or_default(),
            source: self.source.and_then(|s| s.name).unwrap_or_default(),
            subreddit: None,
            published_at: self.published_at.unwrap_or_default(),
            fetched_from: FetchedFrom::NewsApi,
        }
    }
}

/// NewsAPI.org top-headlines adapter.
pub struct NewsApiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiProvider {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// `language=en`, `pageSize=30`, key injected, `q` only when non-empty.
    pub fn request_url(&self, query: &str) -> Result<Url, AggregateError> {
        self.build_url(query, &self.api_key)
    }

    /// Same as [`request_url`](Self::request_url) with the key value masked.
    pub fn display_url(&self, query: &str) -> Result<Url, AggregateError> {
        self.build_url(query, REDACTED)
    }

    fn build_url(&self, query: &str, key: &str) -> Result<Url, AggregateError> {
        let page_size = PAGE_SIZE.to_string();
        let mut params: Vec<(&str, &str)> =
            vec![("apiKey", key), ("language", "en"), ("pageSize", page_size.as_str())];
        if !query.is_empty() {
            params.push(("q", query));
        }
        Url::parse_with_params(&format!("{}{}", self.base_url, TOP_HEADLINES_PATH), &params)
            .map_err(AggregateError::internal)
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch(&self, query: &str) -> Result<AggregationResult, AggregateError> {
        let url = self.request_url(query)?;
        let t0 = std::time::Instant::now();

        let resp = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                // the request URL carries the key
                let e = e.without_url();
                tracing::error!(error = %e, provider = "newsapi", "upstream transport error");
                counter!("news_upstream_errors_total", "provider" => "newsapi").increment(1);
                return Err(e.into());
            }
        };
        histogram!("news_upstream_ms", "provider" => "newsapi")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), provider = "newsapi", "upstream non-success");
            counter!("news_upstream_errors_total", "provider" => "newsapi").increment(1);
            return Err(AggregateError::Upstream {
                provider: "newsapi",
                status: status.as_u16(),
                detail,
            });
        }

        let body: TopHeadlines = resp
            .json()
            .await
            .map_err(|e| AggregateError::internal(e.without_url()))?;

        let total_results = body.total_results;
        let articles: Vec<NormalizedArticle> =
            body.into_items().into_iter().map(Item::into_article).collect();
        let total = total_results
            .filter(|n| *n > 0)
            .unwrap_or(articles.len() as u64);

        let backend_info = BackendInfo {
            provider: "newsapi.org".to_string(),
            api_url: Some(self.display_url(query)?.to_string()),
            api_key_used: Some(!self.api_key.is_empty()),
            timestamp: now_iso(),
            total_results: total,
            ..BackendInfo::default()
        };
        Ok(AggregationResult {
            source: FetchedFrom::NewsApi,
            articles,
            backend_info,
        })
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
