//! Moderation state transitions.
//!
//! An ujala article starts out `approved = false`, becomes visible through
//! [`Article::approve`], and can then be featured on the home page. There is
//! no way back from approval; removal is a delete.
//!
//! Each `Database` method here is a single read-modify-write. Concurrent
//! transitions on the same article are last-write-wins.

use chrono::{DateTime, Utc};
use ujala_shared::content::is_ujala_like;
use ujala_shared::slugify;
use uuid::Uuid;

use crate::codec::now;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Article, ArticleUpdate};

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Article {
    /// Approve for publication.
    ///
    /// The category is normalised to `ujala_category` when it is empty,
    /// already ujala-like, or the article came from a reporter. Approved
    /// items are flagged breaking so they lead the listing.
    pub fn approve(&mut self, ujala_category: &str) {
        self.approved = true;
        self.is_ujala = true;

        let current = self.category.trim();
        if current.is_empty() || is_ujala_like(current) || self.reporter_id.is_some() {
            self.category = ujala_category.to_string();
        }

        self.is_breaking = true;
    }

    /// Put an approved article on the home page. Calling it again moves the
    /// article to the front by refreshing `featured_at`.
    pub fn feature(&mut self, at: DateTime<Utc>) -> Result<()> {
        if !self.approved {
            return Err(StoreError::InvalidState(
                "only approved articles can be featured".into(),
            ));
        }
        self.is_featured = true;
        self.featured_at = Some(at);
        Ok(())
    }

    pub fn unfeature(&mut self) {
        self.is_featured = false;
        self.featured_at = None;
    }

    /// Apply an edit in place. Returns `true` when the title changed, in
    /// which case the slug has been regenerated.
    pub fn apply_update(&mut self, update: ArticleUpdate) -> bool {
        let mut title_changed = false;
        if let Some(title) = filled(update.title) {
            let title = title.trim().to_string();
            if title != self.title {
                self.slug = slugify(&title);
                self.title = title;
                title_changed = true;
            }
        }
        if let Some(description) = filled(update.description) {
            self.description = description;
        }
        if let Some(content) = filled(update.content) {
            self.content = content;
        }
        if let Some(author) = filled(update.author) {
            self.author = author;
        }
        if let Some(location) = filled(update.location) {
            self.location = Some(location);
        }
        if let Some(category) = filled(update.category) {
            self.category = category;
        }
        if let Some(image_path) = filled(update.image_path) {
            self.image_url = Some(image_path.clone());
            self.image_path = Some(image_path);
        }
        if let Some(video_path) = filled(update.video_path) {
            self.video_url = Some(video_path.clone());
            self.video_path = Some(video_path);
        }
        if !update.gallery_images.is_empty() {
            self.gallery_images.extend(update.gallery_images);
            self.is_gallery = true;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(event_date) = update.event_date {
            self.event_date = Some(event_date);
        }
        if let Some(event_venue) = filled(update.event_venue) {
            self.event_venue = Some(event_venue);
        }
        title_changed
    }
}

impl Database {
    /// Approve an article. See [`Article::approve`].
    pub fn approve_article(&self, id: Uuid) -> Result<Article> {
        let mut article = self.get_article(id)?;
        let category = self.defaults().ujala_category.clone();
        article.approve(&category);
        self.save_article(&mut article)?;

        tracing::info!(id = %id, slug = %article.slug, "article approved");
        Ok(article)
    }

    /// Feature an approved article.
    pub fn feature_article(&self, id: Uuid) -> Result<Article> {
        let mut article = self.get_article(id)?;
        article.feature(now())?;
        self.save_article(&mut article)?;

        tracing::info!(id = %id, "article featured");
        Ok(article)
    }

    pub fn unfeature_article(&self, id: Uuid) -> Result<Article> {
        let mut article = self.get_article(id)?;
        article.unfeature();
        self.save_article(&mut article)?;

        tracing::info!(id = %id, "article unfeatured");
        Ok(article)
    }
}
