//! Deployment-specific content defaults and the category policy.
//!
//! Bylines, provenance and the canonical ujala category vary by deployment,
//! so they are injected here rather than baked into the entity.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ADMIN_AUTHOR, DEFAULT_AUTHOR, DEFAULT_REPORTER_AUTHOR, DEFAULT_SOURCE,
    DEFAULT_UJALA_CATEGORY, PLACEHOLDER_IMAGE_URL,
};
use crate::error::SharedError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDefaults {
    /// Byline when nothing else is known.
    pub author: String,
    /// Byline for admin uploads without an author field.
    pub admin_author: String,
    /// Byline for reporter uploads when the token has no name either.
    pub reporter_author: String,
    /// Provenance string stored on every article.
    pub source: String,
    /// Category approved ujala items are normalised to.
    pub ujala_category: String,
    /// Image URL used when an article has no upload.
    pub placeholder_image_url: String,
}

impl Default for ContentDefaults {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            admin_author: DEFAULT_ADMIN_AUTHOR.to_string(),
            reporter_author: DEFAULT_REPORTER_AUTHOR.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            ujala_category: DEFAULT_UJALA_CATEGORY.to_string(),
            placeholder_image_url: PLACEHOLDER_IMAGE_URL.to_string(),
        }
    }
}

/// Whether `category` is free text or must come from a fixed list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryPolicy {
    #[default]
    FreeText,
    Enumerated(Vec<String>),
}

impl CategoryPolicy {
    /// Build a policy from a comma separated list; blank means free text.
    pub fn from_list(list: &str) -> Self {
        let entries: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if entries.is_empty() {
            CategoryPolicy::FreeText
        } else {
            CategoryPolicy::Enumerated(entries)
        }
    }

    /// Check a category against the policy. The canonical ujala category
    /// and the admin upload category are always accepted since the workflow
    /// itself assigns them. Comparison is case-insensitive.
    pub fn validate(&self, category: &str, defaults: &ContentDefaults) -> Result<(), SharedError> {
        let CategoryPolicy::Enumerated(allowed) = self else {
            return Ok(());
        };
        let category = category.trim();
        if category.eq_ignore_ascii_case(&defaults.ujala_category)
            || category.eq_ignore_ascii_case(crate::constants::ADMIN_UPLOAD_CATEGORY)
            || allowed.iter().any(|a| a.eq_ignore_ascii_case(category))
        {
            Ok(())
        } else {
            Err(SharedError::CategoryNotAllowed(category.to_string()))
        }
    }
}

/// True for categories that already name the ujala section.
pub fn is_ujala_like(category: &str) -> bool {
    category.to_lowercase().contains("ujala")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_text_accepts_anything() {
        let policy = CategoryPolicy::from_list("");
        assert_eq!(policy, CategoryPolicy::FreeText);
        assert!(policy.validate("whatever", &ContentDefaults::default()).is_ok());
    }

    #[test]
    fn test_enumerated_policy() {
        let defaults = ContentDefaults::default();
        let policy = CategoryPolicy::from_list("sports, politics ,");
        assert_eq!(
            policy,
            CategoryPolicy::Enumerated(vec!["sports".into(), "politics".into()])
        );
        assert!(policy.validate("Sports", &defaults).is_ok());
        assert!(policy.validate("Moradabad ujala", &defaults).is_ok());
        assert!(policy.validate("ujala", &defaults).is_ok());
        assert_eq!(
            policy.validate("gossip", &defaults),
            Err(SharedError::CategoryNotAllowed("gossip".into()))
        );
    }

    #[test]
    fn test_is_ujala_like() {
        assert!(is_ujala_like("UJALA"));
        assert!(is_ujala_like("Moradabad ujala"));
        assert!(!is_ujala_like("sports"));
    }
}
