//! `/api/news`: ujala submissions, moderation, public listings and the
//! slug lookup that falls back to the live feed.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, warn};
use ujala_shared::constants::{ADMIN_UPLOAD_CATEGORY, DEFAULT_FEATURED_LIMIT, DEFAULT_PAGE_SIZE};
use ujala_shared::Capability;
use ujala_store::{Article, ArticleUpdate, NewArticle, StoreError};

use super::upload::SubmissionForm;
use super::{live, parse_id, positive_or, ApiResponse, AppState, Envelope};
use crate::error::ServerError;
use crate::news_feed::{search_term_from_slug, FeedArticle};
use crate::share::{render_share_page, ShareOrigins};

/// Largest page the public listing serves.
const MAX_PAGE_SIZE: u32 = 100;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        // Live feed
        .route("/", get(live::list_news))
        .route("/breaking", get(live::breaking))
        .route("/featured", get(live::featured))
        .route("/trending", get(live::trending))
        .route("/cache/clear", post(live::clear_cache))
        // Submissions
        .route("/admin/upload", post(admin_upload))
        .route("/reporter/upload", post(reporter_upload))
        // Public listings
        .route("/ujala", get(list_ujala))
        .route("/featured-db", get(list_featured))
        .route("/share/{slug}", get(share_page))
        // Moderation
        .route("/superadmin/approval", get(list_pending))
        .route("/superadmin/approval/{id}/approve", put(approve))
        .route("/admin/approved-news", get(list_approved))
        .route("/admin/approved-news/{id}/feature", put(feature))
        .route("/admin/approved-news/{id}/unfeature", put(unfeature))
        .route("/admin/approved-news/{id}", delete(delete_approved))
        // Single item
        .route(
            "/{key}",
            get(get_by_slug).put(edit_article).delete(delete_article),
        )
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<String>,
    limit: Option<String>,
}

fn not_found() -> ServerError {
    ServerError::NotFound("Not found".into())
}

fn store_err(e: StoreError) -> ServerError {
    match e {
        StoreError::NotFound => not_found(),
        other => other.into(),
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// Insert a submission; its files are queued for removal if the insert
/// fails.
fn insert_submission(state: &AppState, form: &SubmissionForm, new: NewArticle) -> Result<Article, ServerError> {
    let result = state.db().and_then(|db| db.insert_article(new).map_err(ServerError::from));
    if result.is_err() {
        state.cleanup.enqueue(form.uploaded_paths());
    }
    result
}

fn submission(form: &SubmissionForm) -> Result<NewArticle, ServerError> {
    let (title, description, content) = form.require_body()?;
    Ok(NewArticle {
        title,
        description,
        content,
        location: form.text("location"),
        image_path: form.image.clone(),
        video_path: form.video.clone(),
        gallery_images: form.gallery.clone(),
        is_ujala: true,
        approved: Some(false),
        is_gallery: form.flag("isGallery") || !form.gallery.is_empty(),
        is_event: form.flag("isEvent"),
        event_date: form.event_date()?,
        event_venue: form.text("eventVenue"),
        tags: form.tags().unwrap_or_default(),
        ..Default::default()
    })
}

async fn admin_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Article>>, ServerError> {
    state.authorize(&headers, Capability::PublishAsAdmin)?;
    let form = SubmissionForm::read(multipart, &state.media).await?;

    let new = match submission(&form) {
        Ok(new) => NewArticle {
            category: Some(ADMIN_UPLOAD_CATEGORY.to_string()),
            author: Some(
                form.text("author")
                    .unwrap_or_else(|| state.config.content.admin_author.clone()),
            ),
            ..new
        },
        Err(e) => {
            state.cleanup.enqueue(form.uploaded_paths());
            return Err(e);
        }
    };

    let article = insert_submission(&state, &form, new)?;
    info!(id = %article.id, slug = %article.slug, "admin submission received");
    Ok(ApiResponse::data(article).with_message("News uploaded and pending approval"))
}

async fn reporter_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Article>>, ServerError> {
    let claims = state.authorize(&headers, Capability::SubmitArticle)?;
    let form = SubmissionForm::read(multipart, &state.media).await?;

    let new = match submission(&form) {
        Ok(new) => {
            let author = form
                .text("author")
                .or_else(|| Some(claims.name.trim().to_string()).filter(|n| !n.is_empty()))
                .unwrap_or_else(|| state.config.content.reporter_author.clone());
            NewArticle {
                category: Some(state.config.content.ujala_category.clone()),
                author: Some(author),
                reporter_id: claims.account_id(),
                ..new
            }
        }
        Err(e) => {
            state.cleanup.enqueue(form.uploaded_paths());
            return Err(e);
        }
    };

    let article = insert_submission(&state, &form, new)?;
    info!(id = %article.id, reporter = ?article.reporter_id, "reporter submission received");
    Ok(ApiResponse::data(article).with_message("News submitted and pending approval"))
}

// ---------------------------------------------------------------------------
// Public listings
// ---------------------------------------------------------------------------

async fn list_ujala(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Article>>>, ServerError> {
    let page = positive_or(params.page.as_deref(), 1);
    let limit = positive_or(params.limit.as_deref(), DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    let listing = state.db()?.list_public_ujala(page, limit)?;
    Ok(ApiResponse::data(listing.items)
        .with_pagination(listing.pagination)
        .with_source("database"))
}

async fn list_featured(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Article>>>, ServerError> {
    let limit = positive_or(params.limit.as_deref(), DEFAULT_FEATURED_LIMIT).min(MAX_PAGE_SIZE);
    let items = state.db()?.list_featured(limit)?;
    Ok(ApiResponse::data(items).with_source("database"))
}

fn share_origins(state: &AppState, headers: &HeaderMap) -> ShareOrigins {
    let server = state.config.server_url.clone().unwrap_or_else(|| {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        format!("http://{host}")
    });
    let frontend = state
        .config
        .frontend_url
        .clone()
        .unwrap_or_else(|| server.clone());
    ShareOrigins { server, frontend }
}

async fn share_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Html<String>, ServerError> {
    let article = state
        .db()?
        .public_article_by_slug(&slug)?
        .ok_or_else(not_found)?;
    Ok(Html(render_share_page(&article, &share_origins(&state, &headers))))
}

/// `GET /r/{short_id}`: short share link, redirects to the preview page.
pub(super) async fn short_link(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Response, ServerError> {
    let article = state
        .db()?
        .public_article_by_short_id(&short_id)?
        .ok_or_else(not_found)?;
    let location = format!("/api/news/share/{}", article.slug);
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

async fn list_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<Article>>>, ServerError> {
    state.authorize(&headers, Capability::ModerateArticles)?;
    let items = state.db()?.list_pending_approval()?;
    Ok(ApiResponse::data(items))
}

async fn list_approved(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<Article>>>, ServerError> {
    state.authorize(&headers, Capability::ModerateArticles)?;
    let items = state.db()?.list_approved_ujala()?;
    Ok(ApiResponse::data(items))
}

async fn approve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Article>>, ServerError> {
    state.authorize(&headers, Capability::ModerateArticles)?;
    let id = parse_id(&id)?;
    let article = state.db()?.approve_article(id).map_err(store_err)?;
    Ok(ApiResponse::data(article).with_message("News approved"))
}

async fn feature(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Article>>, ServerError> {
    state.authorize(&headers, Capability::ModerateArticles)?;
    let id = parse_id(&id)?;
    let article = state.db()?.feature_article(id).map_err(store_err)?;
    Ok(ApiResponse::data(article).with_message("Marked as featured"))
}

async fn unfeature(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Article>>, ServerError> {
    state.authorize(&headers, Capability::ModerateArticles)?;
    let id = parse_id(&id)?;
    let article = state.db()?.unfeature_article(id).map_err(store_err)?;
    Ok(ApiResponse::data(article).with_message("Removed from featured"))
}

/// Remove an article and queue its files for deletion.
fn remove(state: &AppState, headers: &HeaderMap, raw_id: &str) -> Result<(), ServerError> {
    state.authorize(headers, Capability::ModerateArticles)?;
    let id = parse_id(raw_id)?;
    let removed = state.db()?.delete_article(id)?.ok_or_else(not_found)?;

    state.cleanup.enqueue(removed.media_paths());
    info!(id = %id, slug = %removed.slug, "article deleted");
    Ok(())
}

async fn delete_approved(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    remove(&state, &headers, &id)?;
    Ok(ApiResponse::message("Approved news deleted"))
}

async fn delete_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    remove(&state, &headers, &key)?;
    Ok(ApiResponse::message("News deleted"))
}

// ---------------------------------------------------------------------------
// Single item
// ---------------------------------------------------------------------------

async fn edit_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Article>>, ServerError> {
    state.authorize(&headers, Capability::EditArticle)?;
    let id = parse_id(&key)?;
    let form = SubmissionForm::read(multipart, &state.media).await?;

    let update = match form.event_date() {
        Ok(event_date) => ArticleUpdate {
            title: form.text("title"),
            description: form.text("description"),
            content: form.text("content"),
            author: form.text("author"),
            location: form.text("location"),
            category: form.text("category"),
            image_path: form.image.clone(),
            video_path: form.video.clone(),
            gallery_images: form.gallery.clone(),
            tags: form.tags(),
            event_date,
            event_venue: form.text("eventVenue"),
        },
        Err(e) => {
            state.cleanup.enqueue(form.uploaded_paths());
            return Err(e);
        }
    };

    let result = state.db().and_then(|db| {
        let before = db.get_article(id).map_err(store_err)?;
        let after = db.update_article(id, update)?;
        Ok((before, after))
    });

    let (before, after) = match result {
        Ok(pair) => pair,
        Err(e) => {
            state.cleanup.enqueue(form.uploaded_paths());
            return Err(e);
        }
    };

    // Replaced uploads are no longer referenced.
    let replaced: Vec<String> = [
        (before.image_path, after.image_path.as_ref()),
        (before.video_path, after.video_path.as_ref()),
    ]
    .into_iter()
    .filter_map(|(old, new)| old.filter(|o| Some(o) != new))
    .collect();
    state.cleanup.enqueue(replaced);

    info!(id = %id, slug = %after.slug, "article updated");
    Ok(ApiResponse::data(after).with_message("News updated"))
}

/// Database first, honouring visibility; then the live cache; then a live
/// search built from the slug.
async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServerError> {
    let stored = state.db().and_then(|db| match db.get_article_by_slug(&slug) {
        Ok(article) if article.is_publicly_visible() => {
            db.record_view(article.id)?;
            Ok(Some(Ok(article)))
        }
        // Exists but hidden: do not fall through to the live feed.
        Ok(_) => Ok(Some(Err(not_found()))),
        Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    });

    match stored {
        Ok(Some(Ok(mut article))) => {
            article.views += 1;
            return Ok(ApiResponse::data(article)
                .with_source("database")
                .with_message("News detail from database")
                .into_response());
        }
        Ok(Some(Err(hidden))) => return Err(hidden),
        Ok(None) => {}
        Err(e) => warn!(slug = %slug, error = %e, "database lookup failed, trying live feed"),
    }

    if let Some(cached) = state.feed.article_by_slug(&slug).await {
        return Ok(live_article(cached, "live-cache", "Live article from cache"));
    }

    let Some(term) = search_term_from_slug(&slug) else {
        warn!(slug = %slug, "slug has no searchable tokens");
        return Err(ServerError::NotFound("News not found".into()));
    };

    let first = state
        .feed
        .search(&term, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ServerError::NotFound("News not found".into()))?;
    Ok(live_article(first, "live-api", "Live news detail"))
}

fn live_article(article: FeedArticle, source: &'static str, message: &str) -> Response {
    ApiResponse::data(article)
        .with_source(source)
        .with_message(message)
        .into_response()
}
