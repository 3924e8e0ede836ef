// tests/providers_reddit.rs
//
// Reddit adapter against a local stand-in for www.reddit.com.
//
// Covered:
// - fan-out: one request per configured feed, with the client header
// - fan-out: cross-feed dedupe keeps the copy from the earlier feed
// - fan-out: newest-first ordering, unparseable timestamps last
// - fan-out: failing feeds reduce the pool but never fail the call
//   (error status, undecodable body, timeout)
// - search: request shape, mapping, non-success surfaces as Upstream

use news_feed_aggregator::config::{AggregatorConfig, DEFAULT_FEEDS};
use news_feed_aggregator::providers::reddit::{RedditProvider, FANOUT_DESCRIPTOR};
use news_feed_aggregator::providers::build_http_client;
use news_feed_aggregator::{AggregateError, Aggregator, FetchedFrom};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use std::time::Duration;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing(posts: Vec<Value>) -> Value {
    let children: Vec<Value> = posts
        .into_iter()
        .map(|p| json!({ "kind": "t3", "data": p }))
        .collect();
    json!({ "kind": "Listing", "data": { "children": children } })
}

fn provider(server: &MockServer) -> RedditProvider {
    let cfg = AggregatorConfig::default();
    let http = build_http_client(&cfg.user_agent, cfg.request_timeout).expect("http client");
    RedditProvider::new(http, server.uri(), cfg.feeds)
}

async fn mount_feed(server: &MockServer, feed: &str, posts: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/r/{feed}/hot.json")))
        .and(query_param("limit", "30"))
        .and(header("user-agent", "news-feed-app/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(posts)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_failing_feed(server: &MockServer, feed: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/r/{feed}/hot.json")))
        .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fanout_queries_each_feed_once_and_reports_them() {
    let server = MockServer::start().await;
    for feed in DEFAULT_FEEDS {
        mount_feed(
            &server,
            feed,
            vec![json!({
                "id": format!("{feed}1"),
                "title": format!("Top of {feed}"),
                "subreddit": feed,
                "subreddit_name_prefixed": format!("r/{feed}"),
                "created_utc": 1714564800.0
            })],
        )
        .await;
    }

    let res = provider(&server).hot().await;

    assert_eq!(res.source, FetchedFrom::Reddit);
    assert_eq!(res.articles.len(), 5);
    assert_eq!(res.backend_info.provider, "reddit");
    assert_eq!(res.backend_info.api_url.as_deref(), Some(FANOUT_DESCRIPTOR));
    assert_eq!(
        res.backend_info.subs_queried,
        Some(DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    );
    assert_eq!(res.backend_info.total_results, 5);
    // same timestamp everywhere: stable sort keeps feed-list order
    let subs: Vec<&str> = res
        .articles
        .iter()
        .map(|a| a.subreddit.as_deref().unwrap())
        .collect();
    assert_eq!(subs, DEFAULT_FEEDS.to_vec());
}

#[tokio::test]
async fn fanout_dedupe_keeps_first_feed_in_list_order() {
    let server = MockServer::start().await;
    // "news" precedes "technology" in the feed list
    mount_feed(
        &server,
        "news",
        vec![json!({"id": "shared", "title": "From news", "subreddit": "news", "created_utc": 1714564800.0})],
    )
    .await;
    mount_feed(
        &server,
        "technology",
        vec![json!({"id": "shared", "title": "From technology", "subreddit": "technology", "created_utc": 1714568400.0})],
    )
    .await;
    for feed in ["worldnews", "politics", "business"] {
        mount_feed(&server, feed, vec![]).await;
    }

    let res = provider(&server).hot().await;

    assert_eq!(res.articles.len(), 1);
    assert_eq!(res.articles[0].title, "From news");
    assert_eq!(res.articles[0].id.as_deref(), Some("shared"));
}

#[tokio::test]
async fn fanout_orders_newest_first_with_unknown_dates_last() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "news",
        vec![
            json!({"id": "t3", "title": "no date"}),
            json!({"id": "t2", "title": "older", "created_utc": 1714561200.0}),
        ],
    )
    .await;
    mount_feed(
        &server,
        "worldnews",
        vec![json!({"id": "t1", "title": "newest", "created_utc": 1714564800.0})],
    )
    .await;
    for feed in ["technology", "politics", "business"] {
        mount_feed(&server, feed, vec![]).await;
    }

    let res = provider(&server).hot().await;

    let ids: Vec<&str> = res
        .articles
        .iter()
        .map(|a| a.id.as_deref().unwrap())
        .collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
    assert_eq!(res.articles[2].published_at, "");
}

#[tokio::test]
async fn fanout_survives_two_failing_feeds() {
    let server = MockServer::start().await;
    mount_failing_feed(&server, "news", 500).await;
    mount_failing_feed(&server, "politics", 429).await;
    for feed in ["worldnews", "technology", "business"] {
        mount_feed(
            &server,
            feed,
            vec![json!({"title": format!("only in {feed}")})],
        )
        .await;
    }

    let res = provider(&server).hot().await;

    assert_eq!(res.articles.len(), 3);
    let mut ids: Vec<String> = res
        .articles
        .iter()
        .map(|a| a.id.clone().unwrap())
        .collect();
    ids.sort();
    // no upstream id, url or permalink: composite of feed and title
    assert_eq!(
        ids,
        vec![
            "business-only in business".to_string(),
            "technology-only in technology".to_string(),
            "worldnews-only in worldnews".to_string(),
        ]
    );
    assert!(res
        .articles
        .iter()
        .all(|a| a.subreddit.as_deref() != Some("") && a.fetched_from == FetchedFrom::Reddit));
}

#[tokio::test]
async fn fanout_skips_feed_with_undecodable_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/technology/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;
    for feed in ["news", "worldnews", "politics", "business"] {
        mount_feed(&server, feed, vec![json!({"id": format!("{feed}1"), "title": feed})]).await;
    }

    let res = provider(&server).hot().await;

    let mut ids: Vec<&str> = res
        .articles
        .iter()
        .map(|a| a.id.as_deref().unwrap())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["business1", "news1", "politics1", "worldnews1"]);
    assert_eq!(res.backend_info.total_results, 4);
}

#[tokio::test]
async fn fanout_skips_feed_that_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/politics/hot.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(listing(vec![json!({"id": "late", "title": "too late"})]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    for feed in ["news", "worldnews", "technology", "business"] {
        mount_feed(&server, feed, vec![json!({"id": format!("{feed}1"), "title": feed})]).await;
    }

    let cfg = AggregatorConfig::default();
    let http = build_http_client(&cfg.user_agent, Duration::from_millis(300)).expect("http client");
    let res = RedditProvider::new(http, server.uri(), cfg.feeds).hot().await;

    assert_eq!(res.articles.len(), 4);
    assert!(res.articles.iter().all(|a| a.id.as_deref() != Some("late")));
    assert_eq!(
        res.backend_info.subs_queried.as_ref().map(Vec::len),
        Some(DEFAULT_FEEDS.len())
    );
}

#[tokio::test]
async fn fanout_drops_untitled_items_without_any_identifier() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "news",
        vec![json!({"selftext": "orphan"}), json!({"permalink": "/r/news/comments/p1/"})],
    )
    .await;
    for feed in ["worldnews", "technology", "politics", "business"] {
        mount_feed(&server, feed, vec![]).await;
    }

    let res = provider(&server).hot().await;

    assert_eq!(res.articles.len(), 1);
    assert_eq!(res.articles[0].id.as_deref(), Some("/r/news/comments/p1/"));
}

#[tokio::test]
async fn search_maps_results_and_reports_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "rust"))
        .and(query_param("limit", "30"))
        .and(query_param("sort", "hot"))
        .and(query_param("type", "link"))
        .and(header("user-agent", "news-feed-app/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(vec![
            json!({
                "id": "abc",
                "title": "Rust 2.0?",
                "selftext": "",
                "author": "ferris",
                "subreddit": "rust",
                "preview": {"images": [{"source": {"url": "https://preview.redd.it/x.png?a=1&amp;b=2"}}]},
                "created_utc": 1714564800
            }),
            json!({"title": "broken preview", "preview": {"images": [{"source": null}]}}),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let res = provider(&server).search("rust").await.expect("search ok");

    assert_eq!(res.articles.len(), 2);
    let a = &res.articles[0];
    assert_eq!(a.id.as_deref(), Some("abc"));
    assert_eq!(a.description, "Rust 2.0?");
    assert_eq!(a.source, "u/ferris");
    assert_eq!(a.subreddit.as_deref(), Some("rust"));
    assert_eq!(a.image, "https://preview.redd.it/x.png?a=1&b=2");
    assert_eq!(a.published_at, "2024-05-01T12:00:00.000Z");

    let broken = &res.articles[1];
    assert_eq!(broken.image, "");
    assert_eq!(broken.id.as_deref(), Some(""));

    let url = res.backend_info.api_url.expect("api url");
    assert!(url.starts_with(&server.uri()));
    assert!(url.contains("/search.json?q=rust&limit=30&sort=hot&type=link"));
    assert_eq!(res.backend_info.total_results, 2);
    assert!(res.backend_info.subs_queried.is_none());
}

#[tokio::test]
async fn search_non_success_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .mount(&server)
        .await;

    let err = provider(&server).search("rust").await.unwrap_err();
    match err {
        AggregateError::Upstream {
            provider,
            status,
            detail,
        } => {
            assert_eq!(provider, "reddit");
            assert_eq!(status, 503);
            assert_eq!(detail, "try later");
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn aggregator_routes_reddit_selector_by_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(vec![json!({"id": "s1", "title": "hit"})])))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = AggregatorConfig {
        reddit_base_url: server.uri(),
        ..AggregatorConfig::default()
    }
    .with_newsapi_key("ignored-for-reddit");
    let agg = Aggregator::new(&cfg).expect("aggregator");

    let res = agg.aggregate("hit", "reddit").await.expect("reddit search");
    assert_eq!(res.source, FetchedFrom::Reddit);
    assert_eq!(res.articles[0].id.as_deref(), Some("s1"));
}
