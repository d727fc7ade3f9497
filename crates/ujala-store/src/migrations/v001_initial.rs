//! v001 -- Initial schema creation.
//!
//! Creates the `articles` and `accounts` tables with the base news fields.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Articles
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS articles (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    title       TEXT NOT NULL,
    slug        TEXT NOT NULL,
    short_id    TEXT,                         -- share token, unique when present
    description TEXT NOT NULL,
    content     TEXT NOT NULL,
    category    TEXT NOT NULL,
    image_url   TEXT,
    image_path  TEXT,
    video_url   TEXT,
    location    TEXT,
    reporter_id TEXT,                         -- weak ref -> accounts(id)
    author      TEXT NOT NULL,
    is_ujala    INTEGER NOT NULL DEFAULT 0,
    approved    INTEGER NOT NULL DEFAULT 1,
    views       INTEGER NOT NULL DEFAULT 0,
    is_featured INTEGER NOT NULL DEFAULT 0,
    featured_at TEXT,
    is_breaking INTEGER NOT NULL DEFAULT 0,
    tags        TEXT NOT NULL DEFAULT '[]',   -- JSON array
    source      TEXT NOT NULL,
    created_at  TEXT NOT NULL,                -- RFC-3339, microseconds, UTC
    updated_at  TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_slug ON articles(slug);
CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_short_id ON articles(short_id);
CREATE INDEX IF NOT EXISTS idx_articles_listing
    ON articles(is_ujala, approved, is_breaking DESC, created_at DESC);

-- ----------------------------------------------------------------
-- Accounts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,              -- Argon2 PHC string
    role          TEXT NOT NULL CHECK (role IN ('admin', 'reporter', 'superadmin')),
    is_approved   INTEGER NOT NULL DEFAULT 0,
    reporter_id   TEXT,                       -- short code, unique when present
    approved_at   TEXT,
    avatar        TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_email ON accounts(email);
CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_reporter_id ON accounts(reporter_id);
CREATE INDEX IF NOT EXISTS idx_accounts_role ON accounts(role, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
