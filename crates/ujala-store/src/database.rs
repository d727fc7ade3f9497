//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. It also carries the
//! deployment's content defaults and category policy, which are applied to
//! every article written through it.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use ujala_shared::{CategoryPolicy, ContentDefaults};

use crate::error::Result;
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
    defaults: ContentDefaults,
    categories: CategoryPolicy,
}

impl Database {
    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            defaults: ContentDefaults::default(),
            categories: CategoryPolicy::default(),
        })
    }

    /// Replace the content defaults and category policy applied on write.
    pub fn with_content_settings(
        mut self,
        defaults: ContentDefaults,
        categories: CategoryPolicy,
    ) -> Self {
        self.defaults = defaults;
        self.categories = categories;
        self
    }

    pub fn defaults(&self) -> &ContentDefaults {
        &self.defaults
    }

    pub fn categories(&self) -> &CategoryPolicy {
        &self.categories
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
