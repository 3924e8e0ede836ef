// src/providers/mock.rs
//! Built-in sample catalog, served when no NewsAPI key is configured.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::article::{
    iso_timestamp, AggregateError, AggregationResult, BackendInfo, FetchedFrom, NormalizedArticle,
};
use crate::providers::NewsProvider;

pub const MOCK_NOTE: &str = "Sample/mock data returned because NEWSAPI_KEY is not set";

/// A catalog entry. `age_hours` is relative to the moment of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleArticle {
    pub title: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    pub source: &'static str,
    pub age_hours: i64,
}

pub const SAMPLE_CATALOG: &[SampleArticle] = &[
    SampleArticle {
        title: "Tech startups in the Philippines see surge in funding",
        description: "A wave of investments is flowing into Filipino startups focused on fintech and e-commerce.",
        image: "https://via.placeholder.com/800x450.png?text=Philippines+Tech",
        source: "TechDaily",
        age_hours: 0,
    },
    SampleArticle {
        title: "New gaming laptops announced with powerful GPUs",
        description: "Major manufacturers released next-gen models optimized for creators and gamers.",
        image: "https://via.placeholder.com/800x450.png?text=Gaming+Laptops",
        source: "GamerNews",
        age_hours: 6,
    },
    SampleArticle {
        title: "Climate initiatives push for cleaner cities",
        description: "Local governments are adopting greener policies to reduce emissions.",
        image: "https://via.placeholder.com/800x450.png?text=Climate",
        source: "WorldReport",
        age_hours: 24,
    },
];

pub struct MockProvider {
    catalog: Vec<SampleArticle>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(SAMPLE_CATALOG.to_vec())
    }
}

impl MockProvider {
    pub fn new(catalog: Vec<SampleArticle>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &[SampleArticle] {
        &self.catalog
    }

    /// Filter + map at a fixed `now`, so timestamps stay fresh per call.
    pub fn articles_at(&self, query: &str, now: DateTime<Utc>) -> Vec<NormalizedArticle> {
        let needle = query.to_lowercase();
        self.catalog
            .iter()
            .filter(|a| matches_query(a, &needle))
            .map(|a| NormalizedArticle {
                id: None,
                title: a.title.to_string(),
                description: a.description.to_string(),
                image: a.image.to_string(),
                source: a.source.to_string(),
                subreddit: None,
                published_at: iso_timestamp(now - Duration::hours(a.age_hours)),
                fetched_from: FetchedFrom::Mock,
            })
            .collect()
    }
}

/// `needle` must already be lowercased; empty matches everything.
fn matches_query(a: &SampleArticle, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    format!("{} {}", a.title, a.description)
        .to_lowercase()
        .contains(needle)
}

#[async_trait]
impl NewsProvider for MockProvider {
    async fn fetch(&self, query: &str) -> Result<AggregationResult, AggregateError> {
        let now = Utc::now();
        let articles = self.articles_at(query, now);
        let backend_info = BackendInfo {
            provider: "mock".to_string(),
            note: Some(MOCK_NOTE.to_string()),
            timestamp: iso_timestamp(now),
            total_results: articles.len() as u64,
            ..BackendInfo::default()
        };
        Ok(AggregationResult {
            source: FetchedFrom::Mock,
            articles,
            backend_info,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
