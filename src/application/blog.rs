//! Public read side: published posts, their headings and engagement writes.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::analytics::AnalyticsService;
use crate::application::repos::{CategoriesRepo, PostListScope, PostsRepo, RepoError};
use crate::domain::entities::{CategoryRecord, HeadingRecord, PostAnalyticsRecord, PostRecord};

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("post `{slug}` not found")]
    PostNotFound { slug: String },
    #[error("analytics for post `{slug}` not found")]
    AnalyticsNotFound { slug: String },
    #[error("post `{slug}` references missing category")]
    DanglingCategory { slug: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A post as shown in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub post: PostRecord,
    pub category: CategoryRecord,
    pub view_count: u64,
}

/// A post as shown on its own page.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub post: PostRecord,
    pub category: CategoryRecord,
    pub headings: Vec<HeadingRecord>,
    pub view_count: u64,
}

#[derive(Clone)]
pub struct BlogService {
    posts: Arc<dyn PostsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    analytics: AnalyticsService,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        analytics: AnalyticsService,
    ) -> Self {
        Self {
            posts,
            categories,
            analytics,
        }
    }

    /// All posts visible in `scope`. An empty store yields an empty list.
    pub async fn list_posts(&self, scope: PostListScope) -> Result<Vec<PostSummary>, BlogError> {
        let posts = self.posts.list_posts(scope).await?;
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let categories: HashMap<Uuid, CategoryRecord> = self
            .categories
            .list_categories()
            .await?
            .into_iter()
            .map(|category| (category.id, category))
            .collect();
        let ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();
        let views = self.posts.count_views(&ids).await?;

        posts
            .into_iter()
            .map(|post| {
                let category = categories.get(&post.category_id).cloned().ok_or_else(|| {
                    BlogError::DanglingCategory {
                        slug: post.slug.clone(),
                    }
                })?;
                let view_count = views.get(&post.id).copied().unwrap_or(0);
                Ok(PostSummary {
                    post,
                    category,
                    view_count,
                })
            })
            .collect()
    }

    /// Look up a published post and count the requester's view before
    /// assembling the detail, so the returned `view_count` includes it.
    pub async fn view_published_post(
        &self,
        slug: &str,
        requester_ip: &str,
    ) -> Result<PostDetail, BlogError> {
        let post = self.require_post(PostListScope::Public, slug).await?;

        match self.analytics.increment_view(post.id, requester_ip).await {
            Ok(_) => {}
            Err(RepoError::NotFound) => {
                return Err(BlogError::AnalyticsNotFound {
                    slug: post.slug.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        self.detail(post).await
    }

    /// Headings of the post with `slug`, regardless of its status.
    pub async fn headings(&self, slug: &str) -> Result<Vec<HeadingRecord>, BlogError> {
        let post = self.require_post(PostListScope::Admin, slug).await?;
        Ok(self.posts.list_headings(post.id).await?)
    }

    pub async fn increment_clicks(&self, slug: &str) -> Result<PostAnalyticsRecord, BlogError> {
        let post = self.require_post(PostListScope::Admin, slug).await?;
        Ok(self.analytics.increment_click(post.id).await?)
    }

    pub async fn increment_impressions(
        &self,
        slug: &str,
    ) -> Result<PostAnalyticsRecord, BlogError> {
        let post = self.require_post(PostListScope::Admin, slug).await?;
        Ok(self.analytics.increment_impression(post.id).await?)
    }

    pub(crate) async fn require_post(
        &self,
        scope: PostListScope,
        slug: &str,
    ) -> Result<PostRecord, BlogError> {
        self.posts
            .find_by_slug(scope, slug)
            .await?
            .ok_or_else(|| BlogError::PostNotFound {
                slug: slug.to_string(),
            })
    }

    async fn detail(&self, post: PostRecord) -> Result<PostDetail, BlogError> {
        let category = self
            .categories
            .find_category_by_id(post.category_id)
            .await?
            .ok_or_else(|| BlogError::DanglingCategory {
                slug: post.slug.clone(),
            })?;
        let headings = self.posts.list_headings(post.id).await?;
        let view_count = self
            .posts
            .count_views(&[post.id])
            .await?
            .get(&post.id)
            .copied()
            .unwrap_or(0);

        Ok(PostDetail {
            post,
            category,
            headings,
            view_count,
        })
    }
}
