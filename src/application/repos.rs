//! Repository traits describing persistence adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    CategoryRecord, HeadingRecord, PostAnalyticsRecord, PostRecord, PostViewRecord,
};
use crate::domain::types::{HeadingLevel, PostStatus};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn duplicate(constraint: impl Into<String>) -> Self {
        Self::Duplicate {
            constraint: constraint.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

/// Which posts a read is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    /// Only `published` posts, newest first.
    Public,
    /// Every post, ordered by status then newest first.
    Admin,
}

impl PostListScope {
    pub fn admits(self, status: PostStatus) -> bool {
        match self {
            PostListScope::Public => status == PostStatus::Published,
            PostListScope::Admin => true,
        }
    }
}

/// Result of attempting to record a view for a `(post, ip)` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    Recorded(PostAnalyticsRecord),
    Duplicate,
}

impl ViewOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, ViewOutcome::Recorded(_))
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub keywords: String,
    pub slug: String,
    pub category_id: Uuid,
    pub status: PostStatus,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub keywords: String,
    pub category_id: Uuid,
    pub status: PostStatus,
}

#[derive(Debug, Clone)]
pub struct CreateHeadingParams {
    pub post_id: Uuid,
    pub text: String,
    pub slug: String,
    pub level: HeadingLevel,
    pub order: i32,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError>;

    async fn find_category_by_slug(&self, slug: &str)
    -> Result<Option<CategoryRecord>, RepoError>;

    async fn count_posts_in_category(&self, id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait CategoriesWriteRepo: Send + Sync {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    /// Removes the category and its descendants. Fails with
    /// [`RepoError::Integrity`] while any post references one of them.
    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_posts(&self, scope: PostListScope) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_slug(
        &self,
        scope: PostListScope,
        slug: &str,
    ) -> Result<Option<PostRecord>, RepoError>;

    /// Headings of a post ordered by `order` ascending.
    async fn list_headings(&self, post_id: Uuid) -> Result<Vec<HeadingRecord>, RepoError>;

    /// Distinct-origin view counts keyed by post id. Posts without views are
    /// absent from the map.
    async fn count_views(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError>;

    /// Views of a post, newest first.
    async fn list_views(&self, post_id: Uuid) -> Result<Vec<PostViewRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Inserts the post and its zeroed analytics row in one unit of work.
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Rewrites the editable columns and refreshes `updated_at`.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Removes the post together with its headings, views and analytics.
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    async fn create_heading(&self, params: CreateHeadingParams)
    -> Result<HeadingRecord, RepoError>;
}

/// Engagement counters. Every mutating call is serialised per post by the
/// implementation (row lock or per-post mutex).
#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn find_analytics(&self, post_id: Uuid)
    -> Result<Option<PostAnalyticsRecord>, RepoError>;

    async fn get_or_create_analytics(&self, post_id: Uuid)
    -> Result<PostAnalyticsRecord, RepoError>;

    /// Unlocked read used as a fast path before [`AnalyticsRepo::record_view`].
    async fn has_view(&self, post_id: Uuid, ip_address: &str) -> Result<bool, RepoError>;

    /// Under the post's lock: re-check for an existing `(post, ip)` view, insert
    /// one and bump `views`. Returns [`ViewOutcome::Duplicate`] without
    /// touching anything when the pair was already recorded.
    async fn record_view(&self, post_id: Uuid, ip_address: &str)
    -> Result<ViewOutcome, RepoError>;

    async fn increment_clicks(&self, post_id: Uuid) -> Result<PostAnalyticsRecord, RepoError>;

    async fn increment_impressions(&self, post_id: Uuid)
    -> Result<PostAnalyticsRecord, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
