//! Read-side projections for the public site and the moderation consoles.
//!
//! None of these change state.

use rusqlite::params;

use crate::articles::{row_to_article, ARTICLE_COLUMNS};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Article, Page, Pagination};

const PUBLIC_UJALA: &str = "is_ujala = 1 AND approved = 1";

impl Database {
    fn query_articles(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Article>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, row_to_article)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Approved ujala items, breaking first, newest first. `page` is 1-based.
    pub fn list_public_ujala(&self, page: u32, limit: u32) -> Result<Page<Article>> {
        let page = page.max(1);
        let total: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM articles WHERE {PUBLIC_UJALA}"),
            [],
            |row| row.get(0),
        )?;

        let offset = u64::from(page - 1) * u64::from(limit);
        let items = self.query_articles(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles
                 WHERE {PUBLIC_UJALA}
                 ORDER BY is_breaking DESC, created_at DESC, rowid DESC
                 LIMIT ?1 OFFSET ?2"
            ),
            params![limit, offset as i64],
        )?;

        Ok(Page {
            items,
            pagination: Pagination::new(total as u64, page, limit),
        })
    }

    /// Ujala items waiting for approval, newest first.
    pub fn list_pending_approval(&self) -> Result<Vec<Article>> {
        self.query_articles(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles
                 WHERE is_ujala = 1 AND approved = 0
                 ORDER BY created_at DESC, rowid DESC"
            ),
            [],
        )
    }

    /// Every approved ujala item, newest first. Used by the management console.
    pub fn list_approved_ujala(&self) -> Result<Vec<Article>> {
        self.query_articles(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles
                 WHERE {PUBLIC_UJALA}
                 ORDER BY created_at DESC, rowid DESC"
            ),
            [],
        )
    }

    /// Featured items, most recently featured first.
    pub fn list_featured(&self, limit: u32) -> Result<Vec<Article>> {
        self.query_articles(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles
                 WHERE {PUBLIC_UJALA} AND is_featured = 1
                 ORDER BY featured_at DESC, created_at DESC, rowid DESC
                 LIMIT ?1"
            ),
            params![limit],
        )
    }

    /// Look an article up by slug for public display. Unapproved ujala
    /// items are reported as absent.
    pub fn public_article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        visible(self.get_article_by_slug(slug))
    }

    /// Same visibility rule as [`Database::public_article_by_slug`], keyed
    /// by share token.
    pub fn public_article_by_short_id(&self, short_id: &str) -> Result<Option<Article>> {
        visible(self.get_article_by_short_id(short_id))
    }
}

fn visible(lookup: Result<Article>) -> Result<Option<Article>> {
    match lookup {
        Ok(article) if article.is_publicly_visible() => Ok(Some(article)),
        Ok(_) | Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}
