//! Live feed endpoints under `/api/news`.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use ujala_shared::constants::DEFAULT_PAGE_SIZE;
use ujala_store::Pagination;

use super::{positive_or, ApiResponse, AppState, Envelope};
use crate::error::ServerError;
use crate::news_feed::FeedArticle;

const BREAKING_COUNT: u32 = 10;
const FEATURED_COUNT: u32 = 6;

#[derive(Debug, Deserialize)]
pub(super) struct LiveParams {
    page: Option<String>,
    limit: Option<String>,
    category: Option<String>,
    search: Option<String>,
}

type LiveResponse = Json<ApiResponse<Vec<FeedArticle>>>;

/// `search` wins over `category`; neither means Indian top headlines.
pub(super) async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<LiveParams>,
) -> Result<LiveResponse, ServerError> {
    let page = positive_or(params.page.as_deref(), 1);
    let limit = positive_or(params.limit.as_deref(), DEFAULT_PAGE_SIZE);

    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));

    let news = match (search, category) {
        (Some(query), _) => state.feed.search(query, limit).await?,
        (None, Some(category)) => state.feed.top_headlines(category, limit).await?,
        (None, None) => state.feed.top_headlines("india", limit).await?,
    };

    // The upstream returns a single short page, so paginate what we got.
    let total = news.len() as u64;
    let start = (page as usize - 1).saturating_mul(limit as usize);
    let items: Vec<FeedArticle> = news.into_iter().skip(start).take(limit as usize).collect();

    Ok(ApiResponse::data(items)
        .with_pagination(Pagination::new(total, page, limit))
        .with_source("live-api")
        .with_message("Live news from GNews API"))
}

pub(super) async fn breaking(State(state): State<AppState>) -> Result<LiveResponse, ServerError> {
    let news = state.feed.breaking(BREAKING_COUNT).await?;
    Ok(ApiResponse::data(news)
        .with_source("live-api")
        .with_message("Live breaking news from GNews"))
}

/// Empty rather than an error when no API key is configured.
pub(super) async fn featured(State(state): State<AppState>) -> Result<LiveResponse, ServerError> {
    if !state.feed.is_configured() {
        tracing::warn!("No NEWS_API_KEY configured; featured list is empty");
        return Ok(ApiResponse::data(Vec::new())
            .with_source("live-api")
            .with_message("No API key configured; returning empty featured list"));
    }

    let news = state.feed.featured(FEATURED_COUNT).await?;
    Ok(ApiResponse::data(news)
        .with_source("live-api")
        .with_message("Live featured news from multiple categories"))
}

pub(super) async fn trending(State(state): State<AppState>) -> Result<LiveResponse, ServerError> {
    let (sports, entertainment, business) = futures::try_join!(
        state.feed.top_headlines("sports", 4),
        state.feed.top_headlines("entertainment", 3),
        state.feed.top_headlines("business", 3),
    )?;

    let news: Vec<FeedArticle> = sports
        .into_iter()
        .chain(entertainment)
        .chain(business)
        .collect();

    Ok(ApiResponse::data(news)
        .with_source("live-api")
        .with_message("Live trending news from popular categories"))
}

pub(super) async fn clear_cache(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    state.feed.clear_cache().await;
    ApiResponse::message("Cache cleared successfully")
}
