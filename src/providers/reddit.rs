// src/providers/reddit.rs
//! Reddit public JSON adapter: site-wide search for a query, or a fan-out
//! over the configured subreddits' hot listings when there is none.

use std::collections::HashSet;
use std::time::Instant;

use async_trait::async_trait;
use chrono::DateTime;
use futures::future::join_all;
use metrics::{counter, histogram};
use reqwest::Url;
use serde::Deserialize;

use crate::article::{
    iso_timestamp, now_iso, parse_published, AggregateError, AggregationResult, BackendInfo,
    FetchedFrom, NormalizedArticle,
};
use crate::config::PAGE_SIZE;
use crate::providers::{lenient, non_empty, NewsProvider};

/// `backendInfo.apiUrl` for the fan-out, which has no single URL.
pub const FANOUT_DESCRIPTOR: &str = "multiple r/*/hot";

#[derive(Debug, Default, Deserialize)]
struct Listing {
    #[serde(default, deserialize_with = "lenient")]
    data: Option<ListingData>,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Child {
    #[serde(default, deserialize_with = "lenient")]
    data: Option<Post>,
}

impl Listing {
    /// Every child becomes a post; malformed ones decode as empty posts.
    fn into_posts(self) -> Vec<Post> {
        self.data
            .map(|d| d.children)
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                serde_json::from_value::<Child>(v)
                    .ok()
                    .and_then(|c| c.data)
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Post {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    selftext: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    permalink: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    subreddit: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    subreddit_name_prefixed: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    author: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    created_utc: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    preview: Option<Preview>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<serde_json::Value>,
}

impl Preview {
    /// Only the first entry matters; later entries are never decoded.
    fn first_image(&self) -> Option<PreviewImage> {
        self.images
            .first()
            .filter(|v| !v.is_null())
            .map(|v| serde_json::from_value(v.clone()).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PreviewImage {
    #[serde(default, deserialize_with = "lenient")]
    source: Option<ImageSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ImageSource {
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
}

impl Post {
    /// First preview image (entity-unescaped), else an absolute thumbnail, else empty.
    /// A preview entry without a usable URL yields empty rather than the thumbnail.
    fn image(&self) -> String {
        match self.preview.as_ref().and_then(Preview::first_image) {
            Some(img) => img
                .source
                .as_ref()
                .and_then(|s| s.url.as_deref())
                .map(|u| u.replace("&amp;", "&"))
                .unwrap_or_default(),
            None => self
                .thumbnail
                .as_deref()
                .filter(|t| is_absolute_http_url(t))
                .map(str::to_string)
                .unwrap_or_default(),
        }
    }

    fn published_at(&self) -> String {
        self.created_utc
            .filter(|t| t.is_finite() && *t != 0.0)
            .and_then(|t| DateTime::from_timestamp_millis((t * 1000.0).round() as i64))
            .map(iso_timestamp)
            .unwrap_or_default()
    }

    fn byline(&self) -> String {
        if let Some(prefixed) = non_empty(&self.subreddit_name_prefixed) {
            return prefixed.to_string();
        }
        non_empty(&self.author)
            .map(|a| format!("u/{a}"))
            .unwrap_or_default()
    }

    fn upstream_id(&self) -> Option<&str> {
        non_empty(&self.id)
            .or_else(|| non_empty(&self.url))
            .or_else(|| non_empty(&self.permalink))
    }

    /// Map to the normalized shape. `origin` is the feed the post was listed
    /// in (fan-out only); it backs up `subreddit` and the dedupe id.
    pub(crate) fn into_article(self, origin: Option<&str>) -> NormalizedArticle {
        let title = self.title.clone().unwrap_or_default();
        let id = match (self.upstream_id(), origin) {
            (Some(id), _) => id.to_string(),
            (None, Some(feed)) if !title.is_empty() => format!("{feed}-{title}"),
            (None, _) => String::new(),
        };
        let description = non_empty(&self.selftext)
            .map(str::to_string)
            .unwrap_or_else(|| title.clone());
        let subreddit = non_empty(&self.subreddit)
            .or(origin)
            .unwrap_or_default()
            .to_string();

        NormalizedArticle {
            id: Some(id),
            image: self.image(),
            source: self.byline(),
            published_at: self.published_at(),
            title,
            description,
            subreddit: Some(subreddit),
            fetched_from: FetchedFrom::Reddit,
        }
    }
}

fn is_absolute_http_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// Drop items without an id, keep the first of each id, then order by
/// `publishedAt` descending. Unparseable timestamps sort last; ties keep
/// their incoming order.
pub fn dedupe_and_sort(articles: Vec<NormalizedArticle>) -> Vec<NormalizedArticle> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<NormalizedArticle> = articles
        .into_iter()
        .filter(|a| match a.id.as_deref() {
            Some(id) if !id.is_empty() => seen.insert(id.to_string()),
            _ => false,
        })
        .collect();
    out.sort_by_cached_key(|a| std::cmp::Reverse(parse_published(&a.published_at)));
    out
}

pub struct RedditProvider {
    http: reqwest::Client,
    base_url: String,
    feeds: Vec<String>,
}

impl RedditProvider {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, feeds: Vec<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            feeds,
        }
    }

    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    pub fn search_url(&self, query: &str) -> Result<Url, AggregateError> {
        let limit = PAGE_SIZE.to_string();
        Url::parse_with_params(
            &format!("{}/search.json", self.base_url),
            &[("q", query), ("limit", limit.as_str()), ("sort", "hot"), ("type", "link")],
        )
        .map_err(AggregateError::internal)
    }

    pub fn hot_url(&self, feed: &str) -> Result<Url, AggregateError> {
        let limit = PAGE_SIZE.to_string();
        Url::parse_with_params(
            &format!("{}/r/{}/hot.json", self.base_url, feed),
            &[("limit", limit.as_str())],
        )
        .map_err(AggregateError::internal)
    }

    /// Site-wide search for a non-empty query. No dedupe: one query, one feed.
    pub async fn search(&self, query: &str) -> Result<AggregationResult, AggregateError> {
        let url = self.search_url(query)?;
        let t0 = Instant::now();

        let resp = match self.http.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, provider = "reddit", "upstream transport error");
                counter!("news_upstream_errors_total", "provider" => "reddit").increment(1);
                return Err(e.into());
            }
        };
        histogram!("news_upstream_ms", "provider" => "reddit")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), provider = "reddit", "upstream non-success");
            counter!("news_upstream_errors_total", "provider" => "reddit").increment(1);
            return Err(AggregateError::Upstream {
                provider: "reddit",
                status: status.as_u16(),
                detail,
            });
        }

        let listing: Listing = resp.json().await?;
        let articles: Vec<NormalizedArticle> = listing
            .into_posts()
            .into_iter()
            .map(|p| p.into_article(None))
            .collect();

        let backend_info = BackendInfo {
            provider: "reddit".to_string(),
            api_url: Some(url.to_string()),
            timestamp: now_iso(),
            total_results: articles.len() as u64,
            ..BackendInfo::default()
        };
        Ok(AggregationResult {
            source: FetchedFrom::Reddit,
            articles,
            backend_info,
        })
    }

    /// Scatter/gather over every configured feed. A failing feed contributes
    /// zero posts; the call itself never fails.
    pub async fn hot(&self) -> AggregationResult {
        let per_feed = join_all(self.feeds.iter().map(|feed| self.fetch_feed(feed))).await;

        // join_all keeps input order, so "first wins" follows the feed list.
        let pooled: Vec<NormalizedArticle> = self
            .feeds
            .iter()
            .zip(per_feed)
            .flat_map(|(feed, posts)| {
                posts
                    .into_iter()
                    .map(move |p| p.into_article(Some(feed.as_str())))
            })
            .collect();
        let pooled_len = pooled.len();
        let articles = dedupe_and_sort(pooled);

        tracing::debug!(
            target: "news",
            pooled = pooled_len,
            kept = articles.len(),
            "reddit fan-out merged"
        );

        let backend_info = BackendInfo {
            provider: "reddit".to_string(),
            api_url: Some(FANOUT_DESCRIPTOR.to_string()),
            subs_queried: Some(self.feeds.clone()),
            timestamp: now_iso(),
            total_results: articles.len() as u64,
            ..BackendInfo::default()
        };
        AggregationResult {
            source: FetchedFrom::Reddit,
            articles,
            backend_info,
        }
    }

    async fn fetch_feed(&self, feed: &str) -> Vec<Post> {
        match self.try_fetch_feed(feed).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(error = %e, feed, "reddit feed failed; skipping");
                counter!("news_feed_failures_total", "feed" => feed.to_string()).increment(1);
                Vec::new()
            }
        }
    }

    async fn try_fetch_feed(&self, feed: &str) -> Result<Vec<Post>, AggregateError> {
        let url = self.hot_url(feed)?;
        let t0 = Instant::now();
        let resp = self.http.get(url).send().await?;
        histogram!("news_upstream_ms", "provider" => "reddit")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);

        let status = resp.status();
        if !status.is_success() {
            return Err(AggregateError::Upstream {
                provider: "reddit",
                status: status.as_u16(),
                detail: String::new(),
            });
        }
        let listing: Listing = resp.json().await?;
        Ok(listing.into_posts())
    }
}

#[async_trait]
impl NewsProvider for RedditProvider {
    async fn fetch(&self, query: &str) -> Result<AggregationResult, AggregateError> {
        if query.is_empty() {
            Ok(self.hot().await)
        } else {
            self.search(query).await
        }
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}
