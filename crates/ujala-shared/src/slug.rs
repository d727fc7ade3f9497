//! URL slugs derived from article titles.
//!
//! Letters from any script survive (Devanagari titles stay Devanagari);
//! accents are removed by decomposing and dropping combining marks.

use chrono::Utc;
use rand::Rng;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::constants::{SLUG_FALLBACK_PREFIX, SLUG_FALLBACK_RANDOM_MAX};

/// Derive a URL-safe slug from a title.
///
/// Never returns an empty string: a title with nothing retainable gets a
/// synthetic `item-<unix-millis>-<n>` slug instead.
pub fn slugify(title: &str) -> String {
    let slug = normalize(title);
    if slug.is_empty() {
        fallback_slug()
    } else {
        slug
    }
}

fn normalize(title: &str) -> String {
    // Compatibility decompositions can produce capitals (e.g. fullwidth
    // letters), so lowercase again after NFKD.
    let retained: String = title
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let mut out = String::with_capacity(retained.len());
    let mut pending_hyphen = false;
    for c in retained.chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
            continue;
        }
        if pending_hyphen && !out.is_empty() {
            out.push('-');
        }
        pending_hyphen = false;
        out.push(c);
    }
    out
}

fn fallback_slug() -> String {
    let n = rand::thread_rng().gen_range(0..=SLUG_FALLBACK_RANDOM_MAX);
    format!(
        "{}-{}-{}",
        SLUG_FALLBACK_PREFIX,
        Utc::now().timestamp_millis(),
        n
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_fallback(slug: &str) -> bool {
        let parts: Vec<&str> = slug.split('-').collect();
        parts.len() == 3
            && parts[0] == SLUG_FALLBACK_PREFIX
            && parts[1].parse::<i64>().is_ok()
            && parts[2]
                .parse::<u32>()
                .map(|n| n <= SLUG_FALLBACK_RANDOM_MAX)
                .unwrap_or(false)
    }

    fn assert_well_formed(slug: &str) {
        assert!(!slug.is_empty());
        assert!(!slug.starts_with('-'), "leading hyphen in {slug:?}");
        assert!(!slug.ends_with('-'), "trailing hyphen in {slug:?}");
        assert!(!slug.contains("--"), "doubled hyphen in {slug:?}");
        for c in slug.chars() {
            assert!(
                c == '-' || (c.is_alphanumeric() && !c.is_uppercase()),
                "unexpected {c:?} in {slug:?}"
            );
        }
    }

    #[test]
    fn test_headline() {
        assert_eq!(
            slugify("Road Accident in Moradabad: 3 Injured"),
            "road-accident-in-moradabad-3-injured"
        );
    }

    #[test]
    fn test_punctuation_only_falls_back() {
        let slug = slugify("!!!???");
        assert!(is_fallback(&slug), "got {slug}");
    }

    #[test]
    fn test_emoji_only_falls_back() {
        assert!(is_fallback(&slugify("🔥🔥 🎉")));
        assert!(is_fallback(&slugify("")));
        assert!(is_fallback(&slugify("   ---   ")));
    }

    #[test]
    fn test_accents_stripped() {
        assert_eq!(slugify("Café Déjà Vu"), "cafe-deja-vu");
        assert_eq!(slugify("Ñandú über"), "nandu-uber");
    }

    #[test]
    fn test_devanagari_kept() {
        // vowel signs are combining marks and are dropped
        assert_eq!(slugify("मुरादाबाद News 2024"), "मरदबद-news-2024");
    }

    #[test]
    fn test_fullwidth_lowercased() {
        assert_eq!(slugify("ＡＢＣ Ｎｅｗｓ"), "abc-news");
    }

    #[test]
    fn test_whitespace_and_hyphen_runs() {
        assert_eq!(slugify("  --Hello   World--  "), "hello-world");
        assert_eq!(slugify("Hello - World"), "hello-world");
        assert_eq!(slugify("a\t\nb"), "a-b");
    }

    #[test]
    fn test_distinct_titles_can_collide() {
        assert_eq!(slugify("Rain, rain!"), slugify("rain rain"));
    }

    #[test]
    fn test_well_formed_and_idempotent() {
        let titles = [
            "Road Accident in Moradabad: 3 Injured",
            "Café Déjà Vu",
            "मुरादाबाद News 2024",
            "  --Hello   World--  ",
            "ＡＢＣ Ｎｅｗｓ",
            "C++ & Rust: 2x faster?",
            "!!!???",
            "İstanbul",
        ];
        for title in titles {
            let once = slugify(title);
            assert_well_formed(&once);
            assert_eq!(slugify(&once), once, "not idempotent for {title:?}");
        }
    }
}
