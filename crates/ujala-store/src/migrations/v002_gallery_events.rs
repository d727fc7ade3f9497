//! v002 -- Gallery and event subtypes, uploaded video path.

use rusqlite::Connection;

const UP_SQL: &str = r#"
ALTER TABLE articles ADD COLUMN is_gallery INTEGER NOT NULL DEFAULT 0;
ALTER TABLE articles ADD COLUMN is_event INTEGER NOT NULL DEFAULT 0;
ALTER TABLE articles ADD COLUMN event_date TEXT;
ALTER TABLE articles ADD COLUMN event_venue TEXT;
ALTER TABLE articles ADD COLUMN gallery_images TEXT NOT NULL DEFAULT '[]';  -- JSON array
ALTER TABLE articles ADD COLUMN video_path TEXT;
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
