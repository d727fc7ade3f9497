//! # ujala-store
//!
//! Document store for the Moradabad Ujala backend, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for articles and
//! accounts, the moderation workflow transitions, and the read-side
//! listings the public site and the admin consoles use.

pub mod accounts;
pub mod articles;
pub mod database;
pub mod listings;
pub mod migrations;
pub mod models;
pub mod workflow;

mod codec;
mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
