/// Application name
pub const APP_NAME: &str = "Moradabad Ujala";

/// Canonical category every approved ujala item ends up in
pub const DEFAULT_UJALA_CATEGORY: &str = "Moradabad ujala";

/// Category given to admin uploads before approval
pub const ADMIN_UPLOAD_CATEGORY: &str = "ujala";

/// Default byline for articles created without one
pub const DEFAULT_AUTHOR: &str = "Moradabad Ujala";

/// Byline for admin uploads without an explicit author
pub const DEFAULT_ADMIN_AUTHOR: &str = "Moradabad Ujala Team";

/// Byline for reporter uploads when neither the form nor the token carries a name
pub const DEFAULT_REPORTER_AUTHOR: &str = "Reporter";

/// Default provenance string
pub const DEFAULT_SOURCE: &str = "Moradabad Ujala";

/// Image shown for articles without an upload
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/800x450?text=News+Image";

/// Length of share-link short ids
pub const SHORT_ID_LEN: usize = 10;

/// Random base36 characters appended to the timestamp before truncation
pub const SHORT_ID_RANDOM_LEN: usize = 6;

/// Prefix of the fallback slug used when a title has nothing retainable
pub const SLUG_FALLBACK_PREFIX: &str = "item";

/// Upper bound (inclusive) of the random part of a fallback slug
pub const SLUG_FALLBACK_RANDOM_MAX: u32 = 1_000_000;

/// Prefix of reporter codes
pub const REPORTER_CODE_PREFIX: &str = "RPT";

/// Attempts made to find an unused reporter code before giving up
pub const REPORTER_CODE_MAX_ATTEMPTS: usize = 5;

/// Maximum upload size in bytes (50 MiB)
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default page size for paginated listings
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Default number of items in the featured listing
pub const DEFAULT_FEATURED_LIMIT: u32 = 6;
