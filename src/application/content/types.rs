use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::entities::{PostAnalyticsRecord, PostRecord};
use crate::domain::error::DomainError;
use crate::domain::slug::SlugError;
use crate::domain::types::PostStatus;

pub(crate) const CATEGORY_NAME_MAX: usize = 64;
pub(crate) const CATEGORY_TITLE_MAX: usize = 128;
pub(crate) const CATEGORY_SLUG_MAX: usize = 128;
pub(crate) const POST_TITLE_MAX: usize = 128;
pub(crate) const POST_DESCRIPTION_MAX: usize = 256;
pub(crate) const POST_KEYWORDS_MAX: usize = 128;
pub(crate) const POST_SLUG_MAX: usize = 128;
pub(crate) const HEADING_TEXT_MAX: usize = 256;
pub(crate) const HEADING_SLUG_MAX: usize = 256;

#[derive(Debug, Error)]
pub enum AdminContentError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("`{field}` slug is invalid: {source}")]
    Slug {
        field: &'static str,
        #[source]
        source: SlugError,
    },
    #[error("{entity} `{slug}` not found")]
    NotFound { entity: &'static str, slug: String },
    #[error("category `{slug}` is referenced by {count} posts")]
    CategoryInUse { slug: String, count: u64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminContentError {
    pub(crate) fn not_found(entity: &'static str, slug: &str) -> Self {
        Self::NotFound {
            entity,
            slug: slug.to_string(),
        }
    }

    pub(crate) fn slug(field: &'static str) -> impl FnOnce(SlugError) -> Self {
        move |source| Self::Slug { field, source }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateCategoryCommand {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub slug: Option<String>,
    /// Slug of the parent category.
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreatePostCommand {
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub keywords: String,
    pub slug: Option<String>,
    /// Slug of the owning category.
    pub category: String,
    pub status: PostStatus,
}

/// Partial update: `None` keeps the stored value. `thumbnail: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostCommand {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub thumbnail: Option<Option<String>>,
    pub keywords: Option<String>,
    pub category: Option<String>,
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone)]
pub struct CreateHeadingCommand {
    pub text: String,
    pub slug: Option<String>,
    pub level: i16,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostAnalyticsReport {
    pub post: PostRecord,
    pub analytics: PostAnalyticsRecord,
}

pub(crate) fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

pub(crate) fn ensure_max_len(
    value: &str,
    max: usize,
    field: &'static str,
) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_optional_max_len(
    value: Option<&str>,
    max: usize,
    field: &'static str,
) -> Result<(), DomainError> {
    value.map_or(Ok(()), |value| ensure_max_len(value, max, field))
}

/// Blank optional text is stored as absent.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
