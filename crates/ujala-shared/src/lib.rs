//! # ujala-shared
//!
//! Pure domain helpers shared by the store and the HTTP server: slug and
//! short-id generation, reporter codes, roles and their capabilities, and
//! the configurable content defaults injected into new articles.

pub mod constants;
pub mod content;
pub mod error;
pub mod ids;
pub mod slug;
pub mod types;

pub use content::{CategoryPolicy, ContentDefaults};
pub use error::SharedError;
pub use ids::{generate_reporter_code, generate_short_id};
pub use slug::slugify;
pub use types::{Capability, Role};
