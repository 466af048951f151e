use std::sync::Arc;

use tracing::info;

use crate::application::repos::{CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams};
use crate::domain::entities::CategoryRecord;
use crate::domain::error::DomainError;
use crate::domain::slug::resolve_slug;

use super::types::{
    AdminContentError, CATEGORY_NAME_MAX, CATEGORY_SLUG_MAX, CATEGORY_TITLE_MAX,
    CreateCategoryCommand, ensure_max_len, ensure_non_empty, ensure_optional_max_len,
    normalize_optional,
};

#[derive(Clone)]
pub struct AdminCategoryService {
    reader: Arc<dyn CategoriesRepo>,
    writer: Arc<dyn CategoriesWriteRepo>,
}

impl AdminCategoryService {
    pub fn new(reader: Arc<dyn CategoriesRepo>, writer: Arc<dyn CategoriesWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list(&self) -> Result<Vec<CategoryRecord>, AdminContentError> {
        Ok(self.reader.list_categories().await?)
    }

    pub async fn find(&self, slug: &str) -> Result<CategoryRecord, AdminContentError> {
        self.reader
            .find_category_by_slug(slug)
            .await?
            .ok_or_else(|| AdminContentError::not_found("category", slug))
    }

    pub async fn create(
        &self,
        command: CreateCategoryCommand,
    ) -> Result<CategoryRecord, AdminContentError> {
        let name = command.name.trim().to_string();
        ensure_non_empty(&name, "name")?;
        ensure_max_len(&name, CATEGORY_NAME_MAX, "name")?;

        let title = normalize_optional(command.title);
        ensure_optional_max_len(title.as_deref(), CATEGORY_TITLE_MAX, "title")?;

        let slug = resolve_slug(command.slug.as_deref(), &name, CATEGORY_SLUG_MAX)
            .map_err(AdminContentError::slug("slug"))?;

        let parent_id = match normalize_optional(command.parent) {
            Some(parent) => Some(self.parent(&parent).await?.id),
            None => None,
        };

        let category = self
            .writer
            .create_category(CreateCategoryParams {
                parent_id,
                name,
                title,
                description: normalize_optional(command.description),
                thumbnail: normalize_optional(command.thumbnail),
                slug,
            })
            .await?;

        info!(
            target = "lectern::content",
            category = %category.slug,
            "category created"
        );
        Ok(category)
    }

    /// Deletes a category and its sub-categories. Refused while any post in
    /// that subtree exists.
    pub async fn delete(&self, slug: &str) -> Result<(), AdminContentError> {
        let category = self.find(slug).await?;

        let count = self.reader.count_posts_in_category(category.id).await?;
        if count > 0 {
            return Err(AdminContentError::CategoryInUse {
                slug: category.slug,
                count,
            });
        }

        self.writer.delete_category(category.id).await?;
        info!(
            target = "lectern::content",
            category = %category.slug,
            "category deleted"
        );
        Ok(())
    }

    /// A missing parent is bad input, not a missing resource.
    async fn parent(&self, slug: &str) -> Result<CategoryRecord, AdminContentError> {
        self.reader
            .find_category_by_slug(slug)
            .await?
            .ok_or_else(|| {
                DomainError::validation("parent", format!("category `{slug}` does not exist"))
                    .into()
            })
    }
}
