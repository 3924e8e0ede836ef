// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// --- env defaults & names ---
pub const ENV_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
pub const ENV_NEWSAPI_KEY: &str = "NEWSAPI_KEY";
pub const DEFAULT_CONFIG_PATH: &str = "config/news.toml";

pub const DEFAULT_NEWSAPI_BASE_URL: &str = "https://newsapi.org";
pub const DEFAULT_REDDIT_BASE_URL: &str = "https://www.reddit.com";
pub const DEFAULT_USER_AGENT: &str = "news-feed-app/1.0";
pub const DEFAULT_FEEDS: [&str; 5] = ["news", "worldnews", "technology", "politics", "business"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STATIC_DIR: &str = "frontend";

/// Fixed page size for every upstream request.
pub const PAGE_SIZE: u32 = 30;

/// Runtime configuration for the aggregator and the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub newsapi_base_url: String,
    pub reddit_base_url: String,
    pub user_agent: String,
    pub feeds: Vec<String>,
    pub request_timeout: Duration,
    pub static_dir: PathBuf,
    /// `None` selects the sample catalog instead of NewsAPI.
    pub newsapi_key: Option<String>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            newsapi_base_url: DEFAULT_NEWSAPI_BASE_URL.to_string(),
            reddit_base_url: DEFAULT_REDDIT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            newsapi_key: None,
        }
    }
}

/// On-disk shape; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    newsapi_base_url: Option<String>,
    reddit_base_url: Option<String>,
    user_agent: Option<String>,
    feeds: Option<Vec<String>>,
    request_timeout_secs: Option<u64>,
    static_dir: Option<PathBuf>,
}

impl AggregatorConfig {
    /// Load using env var + fallbacks:
    /// 1) $NEWS_CONFIG_PATH
    /// 2) config/news.toml
    /// 3) built-in defaults
    ///
    /// The API key always comes from $NEWSAPI_KEY.
    pub fn from_env() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.newsapi_key = clean_key(std::env::var(ENV_NEWSAPI_KEY).ok());
        Ok(cfg)
    }

    /// Load from an explicit TOML file. Missing fields keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading news config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing news config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(s)?;
        let mut cfg = Self::default();

        if let Some(v) = file.newsapi_base_url {
            cfg.newsapi_base_url = trim_base(&v);
        }
        if let Some(v) = file.reddit_base_url {
            cfg.reddit_base_url = trim_base(&v);
        }
        if let Some(v) = file.user_agent.filter(|v| !v.trim().is_empty()) {
            cfg.user_agent = v.trim().to_string();
        }
        if let Some(feeds) = file.feeds {
            let cleaned = clean_feeds(feeds);
            if cleaned.is_empty() {
                return Err(anyhow!("`feeds` must name at least one subreddit"));
            }
            cfg.feeds = cleaned;
        }
        if let Some(secs) = file.request_timeout_secs {
            cfg.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(dir) = file.static_dir {
            cfg.static_dir = dir;
        }
        Ok(cfg)
    }

    pub fn with_newsapi_key(mut self, key: impl Into<String>) -> Self {
        self.newsapi_key = clean_key(Some(key.into()));
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.newsapi_key.is_some()
    }
}

fn clean_key(raw: Option<String>) -> Option<String> {
    raw.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

fn trim_base(s: &str) -> String {
    s.trim().trim_end_matches('/').to_string()
}

/// Trim, strip an `r/` prefix, drop blanks and duplicates; keeps first-seen order.
fn clean_feeds(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        let t = t.strip_prefix("r/").unwrap_or(t);
        if !t.is_empty() && !out.iter().any(|f| f == t) {
            out.push(t.to_string());
        }
    }
    out
}
