// src/article.rs
//! Normalized article shape shared by every provider, the response envelope,
//! and the error taxonomy surfaced at the HTTP boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which adapter produced an article (and which provider served a request).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FetchedFrom {
    Mock,
    NewsApi,
    Reddit,
}

impl FetchedFrom {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchedFrom::Mock => "mock",
            FetchedFrom::NewsApi => "newsapi",
            FetchedFrom::Reddit => "reddit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticle {
    /// Present for Reddit results only; used for dedupe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    /// Absolute URL or empty.
    pub image: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    /// RFC 3339 or empty when unknown.
    pub published_at: String,
    pub fetched_from: FetchedFrom,
}

/// Diagnostics describing how a result was obtained. Not article data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackendInfo {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subs_queried: Option<Vec<String>>,
    pub timestamp: String,
    pub total_results: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub source: FetchedFrom,
    pub articles: Vec<NormalizedArticle>,
    pub backend_info: BackendInfo,
}

/// Failures of the primary upstream call. Partial per-feed or per-item
/// failures never surface as one of these.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Upstream reachable but answered with a non-success status.
    #[error("{provider} returned HTTP {status}")]
    Upstream {
        provider: &'static str,
        status: u16,
        detail: String,
    },
    /// Transport, decode, or any other unexpected failure.
    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl AggregateError {
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        AggregateError::Internal {
            detail: detail.to_string(),
        }
    }
}

impl From<reqwest::Error> for AggregateError {
    fn from(e: reqwest::Error) -> Self {
        AggregateError::internal(e)
    }
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn iso_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_iso() -> String {
    iso_timestamp(Utc::now())
}

/// Parse a `publishedAt` value; empty or malformed yields `None`.
pub fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
