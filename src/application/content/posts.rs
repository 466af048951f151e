use std::sync::Arc;

use tracing::info;

use crate::application::analytics::AnalyticsService;
use crate::application::repos::{
    CategoriesRepo, CreateHeadingParams, CreatePostParams, PostListScope, PostsRepo,
    PostsWriteRepo, UpdatePostParams,
};
use crate::domain::entities::{CategoryRecord, HeadingRecord, PostRecord, PostViewRecord};
use crate::domain::error::DomainError;
use crate::domain::slug::resolve_slug;
use crate::domain::types::HeadingLevel;

use super::types::{
    AdminContentError, CreateHeadingCommand, CreatePostCommand, HEADING_SLUG_MAX,
    HEADING_TEXT_MAX, POST_DESCRIPTION_MAX, POST_KEYWORDS_MAX, POST_SLUG_MAX, POST_TITLE_MAX,
    PostAnalyticsReport, UpdatePostCommand, ensure_max_len, ensure_non_empty, normalize_optional,
};

#[derive(Clone)]
pub struct AdminPostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    categories: Arc<dyn CategoriesRepo>,
    analytics: AnalyticsService,
}

impl AdminPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        categories: Arc<dyn CategoriesRepo>,
        analytics: AnalyticsService,
    ) -> Self {
        Self {
            reader,
            writer,
            categories,
            analytics,
        }
    }

    pub async fn find(&self, slug: &str) -> Result<PostRecord, AdminContentError> {
        self.reader
            .find_by_slug(PostListScope::Admin, slug)
            .await?
            .ok_or_else(|| AdminContentError::not_found("post", slug))
    }

    /// Creates the post and its zeroed analytics row together.
    pub async fn create(&self, command: CreatePostCommand) -> Result<PostRecord, AdminContentError> {
        let title = command.title.trim().to_string();
        validate_post_text(&title, &command.description, &command.keywords)?;
        ensure_non_empty(&command.content, "content")?;

        let slug = resolve_slug(command.slug.as_deref(), &title, POST_SLUG_MAX)
            .map_err(AdminContentError::slug("slug"))?;
        let category = self.category(&command.category).await?;

        let post = self
            .writer
            .create_post(CreatePostParams {
                title,
                description: command.description,
                content: command.content,
                thumbnail: normalize_optional(command.thumbnail),
                keywords: command.keywords,
                slug,
                category_id: category.id,
                status: command.status,
            })
            .await?;

        info!(
            target = "lectern::content",
            post = %post.slug,
            status = %post.status,
            "post created"
        );
        Ok(post)
    }

    pub async fn update(
        &self,
        slug: &str,
        command: UpdatePostCommand,
    ) -> Result<PostRecord, AdminContentError> {
        let current = self.find(slug).await?;

        let title = command
            .title
            .map(|title| title.trim().to_string())
            .unwrap_or(current.title);
        let description = command.description.unwrap_or(current.description);
        let keywords = command.keywords.unwrap_or(current.keywords);
        validate_post_text(&title, &description, &keywords)?;

        let content = command.content.unwrap_or(current.content);
        ensure_non_empty(&content, "content")?;

        let category_id = match command.category {
            Some(category) => self.category(&category).await?.id,
            None => current.category_id,
        };
        let thumbnail = match command.thumbnail {
            Some(thumbnail) => normalize_optional(thumbnail),
            None => current.thumbnail,
        };

        let post = self
            .writer
            .update_post(UpdatePostParams {
                id: current.id,
                title,
                description,
                content,
                thumbnail,
                keywords,
                category_id,
                status: command.status.unwrap_or(current.status),
            })
            .await?;

        info!(target = "lectern::content", post = %post.slug, "post updated");
        Ok(post)
    }

    /// Deletes the post; headings, views and analytics go with it.
    pub async fn delete(&self, slug: &str) -> Result<(), AdminContentError> {
        let post = self.find(slug).await?;
        self.writer.delete_post(post.id).await?;
        info!(target = "lectern::content", post = %post.slug, "post deleted");
        Ok(())
    }

    pub async fn add_heading(
        &self,
        post_slug: &str,
        command: CreateHeadingCommand,
    ) -> Result<HeadingRecord, AdminContentError> {
        let post = self.find(post_slug).await?;

        let text = command.text.trim().to_string();
        ensure_non_empty(&text, "text")?;
        ensure_max_len(&text, HEADING_TEXT_MAX, "text")?;
        let level = HeadingLevel::new(command.level)?;
        if command.order < 0 {
            return Err(DomainError::validation("order", "must not be negative").into());
        }
        let slug = resolve_slug(command.slug.as_deref(), &text, HEADING_SLUG_MAX)
            .map_err(AdminContentError::slug("slug"))?;

        let heading = self
            .writer
            .create_heading(CreateHeadingParams {
                post_id: post.id,
                text,
                slug,
                level,
                order: command.order,
            })
            .await?;
        Ok(heading)
    }

    pub async fn analytics(&self, slug: &str) -> Result<PostAnalyticsReport, AdminContentError> {
        let post = self.find(slug).await?;
        let analytics = self.analytics.analytics_for(post.id).await?;
        Ok(PostAnalyticsReport { post, analytics })
    }

    pub async fn views(&self, slug: &str) -> Result<Vec<PostViewRecord>, AdminContentError> {
        let post = self.find(slug).await?;
        Ok(self.reader.list_views(post.id).await?)
    }

    async fn category(&self, slug: &str) -> Result<CategoryRecord, AdminContentError> {
        self.categories
            .find_category_by_slug(slug)
            .await?
            .ok_or_else(|| AdminContentError::not_found("category", slug))
    }
}

fn validate_post_text(title: &str, description: &str, keywords: &str) -> Result<(), DomainError> {
    ensure_non_empty(title, "title")?;
    ensure_max_len(title, POST_TITLE_MAX, "title")?;
    ensure_max_len(description, POST_DESCRIPTION_MAX, "description")?;
    ensure_max_len(keywords, POST_KEYWORDS_MAX, "keywords")?;
    Ok(())
}
