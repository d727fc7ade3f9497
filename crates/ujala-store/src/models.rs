//! Domain model structs persisted in the SQLite database.
//!
//! Every persisted struct derives `Serialize` with camelCase field names so
//! it can be handed to the HTTP layer as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ujala_shared::Role;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// One news item, with its moderation and feature-flag state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Store-generated identifier.
    pub id: Uuid,
    pub title: String,
    /// Derived from `title`; unique, regenerated only when the title changes.
    pub slug: String,
    /// Share-link token; assigned once at insert.
    pub short_id: Option<String>,
    pub description: String,
    pub content: String,
    pub category: String,
    pub image_url: Option<String>,
    /// Upload path under the public directory, e.g. `/uploads/17...-42.jpg`.
    pub image_path: Option<String>,
    pub gallery_images: Vec<String>,
    pub video_url: Option<String>,
    pub video_path: Option<String>,
    pub location: Option<String>,
    /// Account that submitted the item. Lookup only, never owning.
    pub reporter_id: Option<Uuid>,
    pub author: String,
    pub is_ujala: bool,
    pub is_gallery: bool,
    pub is_event: bool,
    pub is_breaking: bool,
    pub is_featured: bool,
    pub event_date: Option<DateTime<Utc>>,
    pub event_venue: Option<String>,
    pub featured_at: Option<DateTime<Utc>>,
    pub approved: bool,
    pub views: i64,
    pub tags: Vec<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Unapproved ujala items are hidden from every public surface.
    pub fn is_publicly_visible(&self) -> bool {
        !self.is_ujala || self.approved
    }

    /// Uploaded files this article owns.
    pub fn media_paths(&self) -> Vec<String> {
        self.image_path
            .iter()
            .chain(self.video_path.iter())
            .chain(self.gallery_images.iter())
            .cloned()
            .collect()
    }
}

/// Input for [`Database::insert_article`](crate::Database::insert_article).
///
/// `None` fields fall back to the store's content defaults.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: Option<String>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub gallery_images: Vec<String>,
    pub video_url: Option<String>,
    pub video_path: Option<String>,
    pub location: Option<String>,
    pub reporter_id: Option<Uuid>,
    pub is_ujala: bool,
    /// Defaults to `true`; submissions through the ujala forms pass `false`.
    pub approved: Option<bool>,
    pub is_gallery: bool,
    pub is_event: bool,
    pub event_date: Option<DateTime<Utc>>,
    pub event_venue: Option<String>,
    pub tags: Vec<String>,
    pub source: Option<String>,
    /// Pre-assigned share token; generated when absent.
    pub short_id: Option<String>,
}

/// Partial edit of an article. `None` leaves the field untouched, and so
/// does an empty string.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    /// Replaces both `image_path` and `image_url`.
    pub image_path: Option<String>,
    /// Replaces both `video_path` and `video_url`.
    pub video_path: Option<String>,
    /// Appended to the existing gallery.
    pub gallery_images: Vec<String>,
    pub tags: Option<Vec<String>>,
    pub event_date: Option<DateTime<Utc>>,
    pub event_venue: Option<String>,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A user of the admin consoles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Trimmed and lower-cased; unique.
    pub email: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    /// Only meaningful for reporters.
    pub is_approved: bool,
    /// Human-facing reporter code, e.g. `RPT4821057`.
    pub reporter_id: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`Database::create_account`](crate::Database::create_account).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_approved: bool,
    pub avatar: Option<String>,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub pages: u64,
    pub limit: u32,
}

impl Pagination {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            total,
            page,
            pages,
            limit,
        }
    }
}

/// One page of a listing plus its pagination block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
