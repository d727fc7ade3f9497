//! Live news from the GNews API, cached in memory.
//!
//! Responses are cached per request for a configurable TTL, and every
//! article that passes through is indexed by its slug so detail pages can
//! be served without a second upstream call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use ujala_shared::slugify;

use crate::config::ServerConfig;
use crate::error::ServerError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Distinct upstream requests kept in memory at once.
const MAX_CACHED_RESPONSES: usize = 256;

/// Upstream categories; anything else is requested as `general`.
const KNOWN_CATEGORIES: &[&str] = &[
    "general",
    "world",
    "nation",
    "business",
    "technology",
    "entertainment",
    "sports",
    "science",
    "health",
];

/// Categories mixed into the featured list.
const FEATURED_CATEGORIES: [&str; 3] = ["nation", "technology", "world"];

/// An article as returned by the live feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedArticle {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub source: String,
    pub category: String,
    pub is_live: bool,
}

#[async_trait]
pub trait NewsFeed: Send + Sync {
    /// False when no API key is configured.
    fn is_configured(&self) -> bool;

    async fn top_headlines(&self, category: &str, max: u32) -> Result<Vec<FeedArticle>, ServerError>;

    async fn search(&self, query: &str, max: u32) -> Result<Vec<FeedArticle>, ServerError>;

    async fn breaking(&self, max: u32) -> Result<Vec<FeedArticle>, ServerError>;

    async fn featured(&self, max: u32) -> Result<Vec<FeedArticle>, ServerError>;

    /// A previously fetched article, looked up by slug.
    async fn article_by_slug(&self, slug: &str) -> Option<FeedArticle>;

    async fn clear_cache(&self);
}

/// Map a site category onto the upstream category set.
pub fn upstream_category(category: &str) -> &'static str {
    let category = category.trim().to_lowercase();
    if category == "india" {
        return "nation";
    }
    KNOWN_CATEGORIES
        .iter()
        .find(|c| **c == category)
        .copied()
        .unwrap_or("general")
}

/// Turn a slug into a short search query: up to four `-` separated tokens
/// that carry at least three consecutive Latin letters or Devanagari
/// characters. `None` when no token qualifies.
pub fn search_term_from_slug(slug: &str) -> Option<String> {
    let tokens: Vec<&str> = slug
        .split('-')
        .map(str::trim)
        .filter(|t| !t.is_empty() && has_word_run(t))
        .take(4)
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

fn has_word_run(token: &str) -> bool {
    let mut latin = 0;
    let mut devanagari = 0;
    for c in token.chars() {
        latin = if c.is_ascii_alphabetic() { latin + 1 } else { 0 };
        devanagari = if ('\u{0900}'..='\u{097F}').contains(&c) {
            devanagari + 1
        } else {
            0
        };
        if latin >= 3 || devanagari >= 3 {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GNewsResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GNewsArticle {
    #[serde(default)]
    title: String,
    description: Option<String>,
    content: Option<String>,
    #[serde(default)]
    url: String,
    image: Option<String>,
    published_at: Option<String>,
    source: Option<GNewsSource>,
}

#[derive(Debug, Deserialize)]
struct GNewsSource {
    name: Option<String>,
}

impl GNewsArticle {
    fn into_feed_article(self, category: &str) -> FeedArticle {
        let description = self.description.unwrap_or_default();
        FeedArticle {
            slug: slugify(&self.title),
            content: self.content.unwrap_or_else(|| description.clone()),
            description,
            title: self.title,
            url: self.url,
            image_url: self.image.filter(|i| !i.is_empty()),
            published_at: self.published_at,
            source: self
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "GNews".to_string()),
            category: category.to_string(),
            is_live: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

struct CachedResponse {
    fetched_at: Instant,
    articles: Vec<FeedArticle>,
}

struct IndexedArticle {
    fetched_at: Instant,
    article: FeedArticle,
}

pub struct GNewsClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    ttl: Duration,
    responses: Arc<RwLock<HashMap<String, CachedResponse>>>,
    by_slug: Arc<RwLock<HashMap<String, IndexedArticle>>>,
}

impl GNewsClient {
    pub fn new(api_key: Option<String>, base_url: String, ttl: Duration) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServerError::Internal(format!("failed to build HTTP client: {e}")))?;

        if api_key.is_none() {
            info!("NEWS_API_KEY not set; live news endpoints are disabled");
        }

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            ttl,
            responses: Arc::new(RwLock::new(HashMap::new())),
            by_slug: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        Self::new(
            config.news_api_key.clone(),
            config.news_api_base_url.clone(),
            config.news_cache_ttl,
        )
    }

    async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        category: &str,
    ) -> Result<Vec<FeedArticle>, ServerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServerError::Feed("NEWS_API_KEY is not configured".into()))?;

        let key = {
            let mut parts: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            parts.sort();
            format!("{endpoint}?{}", parts.join("&"))
        };

        if let Some(hit) = self.responses.read().await.get(&key) {
            if hit.fetched_at.elapsed() < self.ttl {
                debug!(key = %key, "news cache hit");
                return Ok(hit.articles.clone());
            }
        }

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("apikey", api_key)])
            .send()
            .await
            .map_err(|e| ServerError::Feed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServerError::Feed(format!("upstream returned {status}")));
        }

        let body: GNewsResponse = response
            .json()
            .await
            .map_err(|e| ServerError::Feed(format!("malformed response: {e}")))?;

        let articles: Vec<FeedArticle> = body
            .articles
            .into_iter()
            .filter(|a| !a.title.trim().is_empty())
            .map(|a| a.into_feed_article(category))
            .collect();

        debug!(key = %key, count = articles.len(), "fetched live news");

        self.remember(key, &articles).await;
        Ok(articles)
    }

    /// Cache a response and index its articles. Expired entries are dropped
    /// first, then the oldest responses until the cache fits its bound;
    /// slug entries go with the responses that brought them in.
    async fn remember(&self, key: String, articles: &[FeedArticle]) {
        let now = Instant::now();
        let mut responses = self.responses.write().await;
        let mut by_slug = self.by_slug.write().await;

        responses.retain(|_, cached| cached.fetched_at.elapsed() < self.ttl);
        responses.remove(&key);
        while responses.len() >= MAX_CACHED_RESPONSES {
            let Some(oldest) = responses
                .iter()
                .min_by_key(|(_, cached)| cached.fetched_at)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            responses.remove(&oldest);
        }

        let horizon = responses.values().map(|cached| cached.fetched_at).min();
        by_slug.retain(|_, indexed| {
            indexed.fetched_at.elapsed() < self.ttl
                && horizon.is_some_and(|h| indexed.fetched_at >= h)
        });

        for article in articles {
            by_slug.insert(
                article.slug.clone(),
                IndexedArticle {
                    fetched_at: now,
                    article: article.clone(),
                },
            );
        }
        responses.insert(
            key,
            CachedResponse {
                fetched_at: now,
                articles: articles.to_vec(),
            },
        );
    }
}

#[async_trait]
impl NewsFeed for GNewsClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn top_headlines(&self, category: &str, max: u32) -> Result<Vec<FeedArticle>, ServerError> {
        let upstream = upstream_category(category);
        self.fetch(
            "top-headlines",
            &[
                ("category", upstream.to_string()),
                ("lang", "en".to_string()),
                ("country", "in".to_string()),
                ("max", max.to_string()),
            ],
            upstream,
        )
        .await
    }

    async fn search(&self, query: &str, max: u32) -> Result<Vec<FeedArticle>, ServerError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServerError::BadRequest("Search query is empty".into()));
        }
        self.fetch(
            "search",
            &[
                ("q", query.to_string()),
                ("lang", "en".to_string()),
                ("country", "in".to_string()),
                ("max", max.to_string()),
            ],
            "search",
        )
        .await
    }

    async fn breaking(&self, max: u32) -> Result<Vec<FeedArticle>, ServerError> {
        self.top_headlines("general", max).await
    }

    async fn featured(&self, max: u32) -> Result<Vec<FeedArticle>, ServerError> {
        let per_category = max.div_ceil(FEATURED_CATEGORIES.len() as u32).max(1);
        let [a, b, c] = FEATURED_CATEGORIES;
        let (first, second, third) = futures::try_join!(
            self.top_headlines(a, per_category),
            self.top_headlines(b, per_category),
            self.top_headlines(c, per_category),
        )?;

        // Interleave so one category cannot crowd out the others.
        let mut merged = Vec::with_capacity(max as usize);
        let mut lists = [first.into_iter(), second.into_iter(), third.into_iter()];
        while merged.len() < max as usize {
            let mut progressed = false;
            for list in lists.iter_mut() {
                if merged.len() == max as usize {
                    break;
                }
                if let Some(article) = list.next() {
                    merged.push(article);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        Ok(merged)
    }

    async fn article_by_slug(&self, slug: &str) -> Option<FeedArticle> {
        self.by_slug
            .read()
            .await
            .get(slug)
            .filter(|indexed| indexed.fetched_at.elapsed() < self.ttl)
            .map(|indexed| indexed.article.clone())
    }

    async fn clear_cache(&self) {
        self.responses.write().await.clear();
        self.by_slug.write().await.clear();
        info!("news cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::{Query, State};
    use axum::routing::get;
    use axum::{Json, Router};

    #[test]
    fn test_upstream_category() {
        assert_eq!(upstream_category("india"), "nation");
        assert_eq!(upstream_category("Sports"), "sports");
        assert_eq!(upstream_category("astrology"), "general");
    }

    #[test]
    fn test_search_term_from_slug() {
        assert_eq!(
            search_term_from_slug("road-accident-in-moradabad-3-injured").as_deref(),
            Some("road accident moradabad injured")
        );
        assert_eq!(
            search_term_from_slug("मरदबद-news-2024").as_deref(),
            Some("मरदबद news")
        );
        assert_eq!(search_term_from_slug("2024-11-05"), None);
        assert_eq!(search_term_from_slug("a-to-be"), None);
        assert_eq!(search_term_from_slug(""), None);
    }

    /// Minimal upstream that counts how often it is hit.
    async fn fake_upstream(hits: Arc<AtomicUsize>) -> String {
        async fn headlines(
            State(hits): State<Arc<AtomicUsize>>,
            Query(q): Query<HashMap<String, String>>,
        ) -> Json<serde_json::Value> {
            hits.fetch_add(1, Ordering::SeqCst);
            let category = q.get("category").cloned().unwrap_or_default();
            Json(serde_json::json!({
                "totalArticles": 2,
                "articles": [
                    {
                        "title": format!("{category} story one"),
                        "description": "first",
                        "url": "https://example.com/1",
                        "image": "https://example.com/1.jpg",
                        "publishedAt": "2024-01-01T00:00:00Z",
                        "source": { "name": "Example" }
                    },
                    {
                        "title": format!("{category} story two"),
                        "url": "https://example.com/2"
                    }
                ]
            }))
        }

        let app = Router::new()
            .route("/top-headlines", get(headlines))
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_responses_are_cached_and_indexed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = fake_upstream(hits.clone()).await;
        let feed = GNewsClient::new(Some("key".into()), base, Duration::from_secs(60)).unwrap();

        let first = feed.top_headlines("india", 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].title, "nation story one");
        assert_eq!(first[0].source, "Example");
        assert_eq!(first[1].content, "");

        let again = feed.top_headlines("india", 2).await.unwrap();
        assert_eq!(again, first);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let cached = feed.article_by_slug("nation-story-one").await.unwrap();
        assert_eq!(cached.url, "https://example.com/1");

        feed.clear_cache().await;
        assert!(feed.article_by_slug("nation-story-one").await.is_none());
        feed.top_headlines("india", 2).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_featured_interleaves_categories() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = fake_upstream(hits.clone()).await;
        let feed = GNewsClient::new(Some("key".into()), base, Duration::from_secs(60)).unwrap();

        let featured = feed.featured(4).await.unwrap();
        let titles: Vec<&str> = featured.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "nation story one",
                "technology story one",
                "world story one",
                "nation story two",
            ]
        );
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = fake_upstream(hits.clone()).await;
        let feed = GNewsClient::new(Some("key".into()), base, Duration::from_millis(50)).unwrap();

        feed.top_headlines("india", 2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(feed.article_by_slug("nation-story-one").await.is_none());

        feed.top_headlines("sports", 2).await.unwrap();
        let responses = feed.responses.read().await;
        assert_eq!(responses.len(), 1);
        assert!(responses.keys().all(|k| k.contains("category=sports")));
        drop(responses);

        let by_slug = feed.by_slug.read().await;
        assert!(!by_slug.contains_key("nation-story-one"));
        assert!(by_slug.contains_key("sports-story-one"));
    }

    #[tokio::test]
    async fn test_cache_size_is_bounded() {
        let feed = GNewsClient::new(None, "http://127.0.0.1:9".into(), Duration::from_secs(60)).unwrap();
        let article = |n: usize| FeedArticle {
            title: format!("story {n}"),
            slug: format!("story-{n}"),
            description: String::new(),
            content: String::new(),
            url: String::new(),
            image_url: None,
            published_at: None,
            source: "Example".into(),
            category: "search".into(),
            is_live: true,
        };

        feed.remember("search?q=0".into(), &[article(0)]).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        for n in 1..=MAX_CACHED_RESPONSES {
            feed.remember(format!("search?q={n}"), &[article(n)]).await;
        }

        let responses = feed.responses.read().await;
        assert_eq!(responses.len(), MAX_CACHED_RESPONSES);
        assert!(!responses.contains_key("search?q=0"));
        assert!(responses.contains_key(&format!("search?q={MAX_CACHED_RESPONSES}")));
        drop(responses);

        assert!(feed.article_by_slug("story-0").await.is_none());
        assert!(feed.article_by_slug("story-1").await.is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_feed_errors() {
        let feed = GNewsClient::new(None, "http://127.0.0.1:9".into(), Duration::from_secs(1)).unwrap();
        assert!(!feed.is_configured());
        assert!(matches!(
            feed.breaking(10).await,
            Err(ServerError::Feed(_))
        ));
    }
}
