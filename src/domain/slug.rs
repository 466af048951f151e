//! URL-safe identifiers for categories, posts and headings.
//!
//! A slug is either supplied by the author or derived once, at creation time,
//! from the entity's human-readable text. Derived slugs go through the `slug`
//! crate, which transliterates non-ASCII input before collapsing everything
//! that is not alphanumeric into single hyphens.

use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("slug `{slug}` may only contain letters, digits, hyphens and underscores")]
    InvalidCharacters { slug: String },
    #[error("slug exceeds {max} characters")]
    TooLong { max: usize },
}

/// Derive a slug from human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Check an author-supplied slug against the `[-a-zA-Z0-9_]+` alphabet and a
/// length ceiling.
pub fn validate_slug(slug: &str, max_len: usize) -> Result<(), SlugError> {
    if slug.is_empty() {
        return Err(SlugError::EmptyInput);
    }
    if !slug
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(SlugError::InvalidCharacters {
            slug: slug.to_string(),
        });
    }
    if slug.chars().count() > max_len {
        return Err(SlugError::TooLong { max: max_len });
    }
    Ok(())
}

/// Use `explicit` when present and non-blank, otherwise derive from `source`.
/// Either way the result is validated against `max_len`.
pub fn resolve_slug(
    explicit: Option<&str>,
    source: &str,
    max_len: usize,
) -> Result<String, SlugError> {
    let slug = match explicit.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.to_string(),
        None => derive_slug(source)?,
    };
    validate_slug(&slug, max_len)?;
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(derive_slug("Hello, World!").expect("slug"), "hello-world");
        assert_eq!(derive_slug("  Getting   Started ").expect("slug"), "getting-started");
    }

    #[test]
    fn derive_slug_transliterates_accents() {
        assert_eq!(derive_slug("Café Olé").expect("slug"), "cafe-ole");
    }

    #[test]
    fn derive_slug_rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn validate_slug_enforces_alphabet_and_length() {
        assert!(validate_slug("intro_to-rust2", 32).is_ok());
        assert!(matches!(
            validate_slug("has space", 32),
            Err(SlugError::InvalidCharacters { .. })
        ));
        assert_eq!(validate_slug("abcdef", 5), Err(SlugError::TooLong { max: 5 }));
    }

    #[test]
    fn resolve_slug_prefers_explicit_value() {
        assert_eq!(
            resolve_slug(Some("custom"), "Ignored Title", 128).expect("slug"),
            "custom"
        );
        assert_eq!(
            resolve_slug(Some("  "), "Derived Title", 128).expect("slug"),
            "derived-title"
        );
        assert_eq!(
            resolve_slug(None, "Derived Title", 128).expect("slug"),
            "derived-title"
        );
    }
}
