//! CRUD operations for [`Article`] records.

use rusqlite::named_params;
use ujala_shared::{generate_short_id, slugify};
use uuid::Uuid;

use crate::codec::{
    fmt_list, fmt_opt_ts, fmt_ts, get_list, get_opt_ts, get_opt_uuid, get_ts, get_uuid, now,
};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Article, ArticleUpdate, NewArticle};

pub(crate) const ARTICLE_COLUMNS: &str = "id, title, slug, short_id, description, content, \
     category, image_url, image_path, gallery_images, video_url, video_path, location, \
     reporter_id, author, is_ujala, is_gallery, is_event, is_breaking, is_featured, \
     event_date, event_venue, featured_at, approved, views, tags, source, created_at, updated_at";

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new article, deriving its slug and short id.
    ///
    /// Fails with [`StoreError::Duplicate`] when the slug or short id is
    /// already taken; nothing is written in that case.
    pub fn insert_article(&self, new: NewArticle) -> Result<Article> {
        require("title", &new.title)?;
        require("description", &new.description)?;
        require("content", &new.content)?;

        let defaults = self.defaults();
        let category =
            non_blank(new.category).unwrap_or_else(|| defaults.ujala_category.clone());
        self.categories()
            .validate(&category, defaults)
            .map_err(|e| StoreError::Validation(e.to_string()))?;

        let now = now();
        let title = new.title.trim().to_string();
        let image_url = non_blank(new.image_url)
            .or_else(|| new.image_path.clone())
            .or_else(|| Some(defaults.placeholder_image_url.clone()));
        let video_url = non_blank(new.video_url).or_else(|| new.video_path.clone());

        let article = Article {
            id: Uuid::new_v4(),
            slug: slugify(&title),
            short_id: Some(non_blank(new.short_id).unwrap_or_else(generate_short_id)),
            title,
            description: new.description,
            content: new.content,
            category,
            image_url,
            image_path: new.image_path,
            gallery_images: new.gallery_images,
            video_url,
            video_path: new.video_path,
            location: new.location,
            reporter_id: new.reporter_id,
            author: non_blank(new.author).unwrap_or_else(|| defaults.author.clone()),
            is_ujala: new.is_ujala,
            is_gallery: new.is_gallery,
            is_event: new.is_event,
            is_breaking: false,
            is_featured: false,
            event_date: new.event_date,
            event_venue: new.event_venue,
            featured_at: None,
            approved: new.approved.unwrap_or(true),
            views: 0,
            tags: new.tags,
            source: non_blank(new.source).unwrap_or_else(|| defaults.source.clone()),
            created_at: now,
            updated_at: now,
        };

        self.conn().execute(
            &format!(
                "INSERT INTO articles ({ARTICLE_COLUMNS}) VALUES (
                    :id, :title, :slug, :short_id, :description, :content,
                    :category, :image_url, :image_path, :gallery_images, :video_url, :video_path,
                    :location, :reporter_id, :author, :is_ujala, :is_gallery, :is_event,
                    :is_breaking, :is_featured, :event_date, :event_venue, :featured_at,
                    :approved, :views, :tags, :source, :created_at, :updated_at)"
            ),
            named_params! {
                ":id": article.id.to_string(),
                ":title": article.title,
                ":slug": article.slug,
                ":short_id": article.short_id,
                ":description": article.description,
                ":content": article.content,
                ":category": article.category,
                ":image_url": article.image_url,
                ":image_path": article.image_path,
                ":gallery_images": fmt_list(&article.gallery_images)?,
                ":video_url": article.video_url,
                ":video_path": article.video_path,
                ":location": article.location,
                ":reporter_id": article.reporter_id.map(|id| id.to_string()),
                ":author": article.author,
                ":is_ujala": article.is_ujala,
                ":is_gallery": article.is_gallery,
                ":is_event": article.is_event,
                ":is_breaking": article.is_breaking,
                ":is_featured": article.is_featured,
                ":event_date": fmt_opt_ts(&article.event_date),
                ":event_venue": article.event_venue,
                ":featured_at": fmt_opt_ts(&article.featured_at),
                ":approved": article.approved,
                ":views": article.views,
                ":tags": fmt_list(&article.tags)?,
                ":source": article.source,
                ":created_at": fmt_ts(&article.created_at),
                ":updated_at": fmt_ts(&article.updated_at),
            },
        )?;

        tracing::debug!(id = %article.id, slug = %article.slug, "inserted article");
        Ok(article)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single article by id.
    pub fn get_article(&self, id: Uuid) -> Result<Article> {
        self.article_where("id = ?1", &id.to_string())
    }

    /// Fetch a single article by slug, regardless of visibility.
    pub fn get_article_by_slug(&self, slug: &str) -> Result<Article> {
        self.article_where("slug = ?1", slug)
    }

    /// Fetch a single article by share token, regardless of visibility.
    pub fn get_article_by_short_id(&self, short_id: &str) -> Result<Article> {
        self.article_where("short_id = ?1", short_id)
    }

    fn article_where(&self, predicate: &str, value: &str) -> Result<Article> {
        self.conn()
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE {predicate}"),
                [value],
                row_to_article,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::from(other),
            })
    }

    pub fn count_articles(&self) -> Result<i64> {
        let n = self
            .conn()
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(n)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial edit and persist it. The slug is regenerated only
    /// when the title actually changes.
    pub fn update_article(&self, id: Uuid, update: ArticleUpdate) -> Result<Article> {
        let mut article = self.get_article(id)?;
        if let Some(category) = update.category.as_deref().filter(|c| !c.trim().is_empty()) {
            self.categories()
                .validate(category, self.defaults())
                .map_err(|e| StoreError::Validation(e.to_string()))?;
        }
        article.apply_update(update);
        self.save_article(&mut article)?;
        Ok(article)
    }

    /// Write every mutable column of `article` back and bump `updated_at`.
    pub fn save_article(&self, article: &mut Article) -> Result<()> {
        require("title", &article.title)?;
        require("description", &article.description)?;
        require("content", &article.content)?;

        article.updated_at = now();

        let affected = self.conn().execute(
            "UPDATE articles SET
                title = :title, slug = :slug, description = :description, content = :content,
                category = :category, image_url = :image_url, image_path = :image_path,
                gallery_images = :gallery_images, video_url = :video_url, video_path = :video_path,
                location = :location, author = :author, is_ujala = :is_ujala,
                is_gallery = :is_gallery, is_event = :is_event, is_breaking = :is_breaking,
                is_featured = :is_featured, event_date = :event_date, event_venue = :event_venue,
                featured_at = :featured_at, approved = :approved, views = :views, tags = :tags,
                source = :source, updated_at = :updated_at
             WHERE id = :id",
            named_params! {
                ":id": article.id.to_string(),
                ":title": article.title,
                ":slug": article.slug,
                ":description": article.description,
                ":content": article.content,
                ":category": article.category,
                ":image_url": article.image_url,
                ":image_path": article.image_path,
                ":gallery_images": fmt_list(&article.gallery_images)?,
                ":video_url": article.video_url,
                ":video_path": article.video_path,
                ":location": article.location,
                ":author": article.author,
                ":is_ujala": article.is_ujala,
                ":is_gallery": article.is_gallery,
                ":is_event": article.is_event,
                ":is_breaking": article.is_breaking,
                ":is_featured": article.is_featured,
                ":event_date": fmt_opt_ts(&article.event_date),
                ":event_venue": article.event_venue,
                ":featured_at": fmt_opt_ts(&article.featured_at),
                ":approved": article.approved,
                ":views": article.views,
                ":tags": fmt_list(&article.tags)?,
                ":source": article.source,
                ":updated_at": fmt_ts(&article.updated_at),
            },
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Bump the view counter of a publicly served article.
    pub fn record_view(&self, id: Uuid) -> Result<()> {
        self.conn().execute(
            "UPDATE articles SET views = views + 1 WHERE id = ?1",
            [id.to_string()],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove an article and hand back the removed record so the caller can
    /// clean up its media. `None` when no such article exists.
    pub fn delete_article(&self, id: Uuid) -> Result<Option<Article>> {
        let article = match self.get_article(id) {
            Ok(article) => article,
            Err(StoreError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };

        self.conn()
            .execute("DELETE FROM articles WHERE id = ?1", [id.to_string()])?;

        tracing::debug!(id = %id, "deleted article");
        Ok(Some(article))
    }
}

pub(crate) fn row_to_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: get_uuid(row, "id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        short_id: row.get("short_id")?,
        description: row.get("description")?,
        content: row.get("content")?,
        category: row.get("category")?,
        image_url: row.get("image_url")?,
        image_path: row.get("image_path")?,
        gallery_images: get_list(row, "gallery_images")?,
        video_url: row.get("video_url")?,
        video_path: row.get("video_path")?,
        location: row.get("location")?,
        reporter_id: get_opt_uuid(row, "reporter_id")?,
        author: row.get("author")?,
        is_ujala: row.get("is_ujala")?,
        is_gallery: row.get("is_gallery")?,
        is_event: row.get("is_event")?,
        is_breaking: row.get("is_breaking")?,
        is_featured: row.get("is_featured")?,
        event_date: get_opt_ts(row, "event_date")?,
        event_venue: row.get("event_venue")?,
        featured_at: get_opt_ts(row, "featured_at")?,
        approved: row.get("approved")?,
        views: row.get("views")?,
        tags: get_list(row, "tags")?,
        source: row.get("source")?,
        created_at: get_ts(row, "created_at")?,
        updated_at: get_ts(row, "updated_at")?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ujala_shared::constants::SHORT_ID_LEN;
    use ujala_shared::{CategoryPolicy, ContentDefaults};

    pub(crate) fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    pub(crate) fn new_article(title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            description: "desc".to_string(),
            content: "body".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn insert_derives_slug_and_short_id() {
        let (db, _dir) = test_db();
        let article = db
            .insert_article(new_article("Road Accident in Moradabad: 3 Injured"))
            .unwrap();

        assert_eq!(article.slug, "road-accident-in-moradabad-3-injured");
        assert_eq!(article.short_id.as_deref().map(str::len), Some(SHORT_ID_LEN));
        assert!(article.approved);
        assert_eq!(article.author, ContentDefaults::default().author);
        assert_eq!(article.category, ContentDefaults::default().ujala_category);

        let fetched = db.get_article(article.id).unwrap();
        assert_eq!(fetched, article);
    }

    #[test]
    fn duplicate_slug_fails() {
        let (db, _dir) = test_db();
        db.insert_article(new_article("Rain, rain!")).unwrap();

        let err = db.insert_article(new_article("rain rain")).unwrap_err();
        assert!(
            matches!(err, StoreError::Duplicate { ref field } if field == "slug"),
            "got {err:?}"
        );
        assert_eq!(db.count_articles().unwrap(), 1);
    }

    #[test]
    fn duplicate_short_id_fails() {
        let (db, _dir) = test_db();
        let mut first = new_article("first");
        first.short_id = Some("abcdefghij".into());
        db.insert_article(first).unwrap();

        let mut second = new_article("second");
        second.short_id = Some("abcdefghij".into());
        let err = db.insert_article(second).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref field } if field == "short_id"));
    }

    #[test]
    fn missing_required_field_rejected() {
        let (db, _dir) = test_db();
        let mut article = new_article("title");
        article.content = "   ".into();
        assert!(matches!(
            db.insert_article(article),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(db.count_articles().unwrap(), 0);
    }

    #[test]
    fn short_id_stable_across_saves() {
        let (db, _dir) = test_db();
        let mut article = db.insert_article(new_article("stable")).unwrap();
        let short_id = article.short_id.clone();

        article.views = 3;
        db.save_article(&mut article).unwrap();
        let updated = db
            .update_article(
                article.id,
                ArticleUpdate {
                    title: Some("a new title".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.short_id, short_id);
        assert_eq!(db.get_article(article.id).unwrap().short_id, short_id);
    }

    #[test]
    fn slug_follows_title_only() {
        let (db, _dir) = test_db();
        let article = db.insert_article(new_article("Old Title")).unwrap();

        let edited = db
            .update_article(
                article.id,
                ArticleUpdate {
                    content: Some("new body".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(edited.slug, "old-title");

        let renamed = db
            .update_article(
                article.id,
                ArticleUpdate {
                    title: Some("New Title".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.slug, "new-title");
        assert!(db.get_article_by_slug("old-title").is_err());
        assert_eq!(db.get_article_by_slug("new-title").unwrap().id, article.id);
    }

    #[test]
    fn rename_onto_taken_slug_leaves_row_untouched() {
        let (db, _dir) = test_db();
        db.insert_article(new_article("Alpha")).unwrap();
        let beta = db.insert_article(new_article("Beta")).unwrap();

        let err = db
            .update_article(
                beta.id,
                ArticleUpdate {
                    title: Some("ALPHA!".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(
            matches!(err, StoreError::Duplicate { ref field } if field == "slug"),
            "got {err:?}"
        );

        let stored = db.get_article(beta.id).unwrap();
        assert_eq!(stored.title, "Beta");
        assert_eq!(stored.slug, "beta");
        assert_eq!(db.count_articles().unwrap(), 2);
    }

    #[test]
    fn enumerated_category_policy_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db"))
            .unwrap()
            .with_content_settings(
                ContentDefaults::default(),
                CategoryPolicy::from_list("sports,politics"),
            );

        let mut ok = new_article("match report");
        ok.category = Some("sports".into());
        let article = db.insert_article(ok).unwrap();

        let mut bad = new_article("gossip column");
        bad.category = Some("gossip".into());
        assert!(matches!(db.insert_article(bad), Err(StoreError::Validation(_))));

        let err = db
            .update_article(
                article.id,
                ArticleUpdate {
                    category: Some("gossip".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(db.get_article(article.id).unwrap().category, "sports");
    }

    #[test]
    fn list_fields_round_trip() {
        let (db, _dir) = test_db();
        let mut new = new_article("gallery");
        new.is_gallery = true;
        new.gallery_images = vec!["/uploads/a.jpg".into(), "/uploads/b.jpg".into()];
        new.tags = vec!["local".into()];
        let article = db.insert_article(new).unwrap();

        let fetched = db.get_article(article.id).unwrap();
        assert!(fetched.is_gallery);
        assert_eq!(fetched.gallery_images, article.gallery_images);
        assert_eq!(fetched.tags, vec!["local".to_string()]);
    }

    #[test]
    fn delete_missing_returns_none() {
        let (db, _dir) = test_db();
        db.insert_article(new_article("keep me")).unwrap();

        assert!(db.delete_article(Uuid::new_v4()).unwrap().is_none());
        assert_eq!(db.count_articles().unwrap(), 1);
    }

    #[test]
    fn delete_removes_from_lookups() {
        let (db, _dir) = test_db();
        let mut new = new_article("to be removed");
        new.image_path = Some("/uploads/x.jpg".into());
        let article = db.insert_article(new).unwrap();

        let removed = db.delete_article(article.id).unwrap().unwrap();
        assert_eq!(removed.media_paths(), vec!["/uploads/x.jpg".to_string()]);
        assert!(matches!(db.get_article(article.id), Err(StoreError::NotFound)));
        assert!(matches!(
            db.get_article_by_slug("to-be-removed"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn record_view_increments() {
        let (db, _dir) = test_db();
        let article = db.insert_article(new_article("popular")).unwrap();
        db.record_view(article.id).unwrap();
        db.record_view(article.id).unwrap();
        assert_eq!(db.get_article(article.id).unwrap().views, 2);
    }
}
