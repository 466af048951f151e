//! Process-local repository implementation.
//!
//! Backs the `serve` command when no database is configured and the
//! integration tests. Analytics rows sit behind one async mutex per post so
//! view, click and impression updates of a post are serialised while other
//! posts proceed independently. Lock order is always analytics mutex first,
//! then the catalogue lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::application::repos::{
    AnalyticsRepo, CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams,
    CreateHeadingParams, CreatePostParams, HealthRepo, PostListScope, PostsRepo, PostsWriteRepo,
    RepoError, UpdatePostParams, ViewOutcome,
};
use crate::domain::entities::{
    CategoryRecord, HeadingRecord, PostAnalyticsRecord, PostRecord, PostViewRecord,
};

type AnalyticsCell = Arc<Mutex<PostAnalyticsRecord>>;

#[derive(Default)]
struct Catalogue {
    categories: HashMap<Uuid, CategoryRecord>,
    posts: HashMap<Uuid, PostRecord>,
    headings: HashMap<Uuid, HeadingRecord>,
}

impl Catalogue {
    fn category_subtree(&self, root: Uuid) -> HashSet<Uuid> {
        let mut subtree = HashSet::from([root]);
        let mut frontier = vec![root];
        while let Some(parent) = frontier.pop() {
            for category in self.categories.values() {
                if category.parent_id == Some(parent) && subtree.insert(category.id) {
                    frontier.push(category.id);
                }
            }
        }
        subtree
    }

    fn ensure_category_unique(&self, name: &str, slug: &str) -> Result<(), RepoError> {
        for category in self.categories.values() {
            if category.name == name {
                return Err(RepoError::duplicate("categories_name_key"));
            }
            if category.slug == slug {
                return Err(RepoError::duplicate("categories_slug_key"));
            }
        }
        Ok(())
    }

    fn ensure_category_exists(&self, id: Uuid) -> Result<(), RepoError> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::InvalidInput {
                message: format!("category `{id}` does not exist"),
            })
        }
    }
}

#[derive(Default)]
pub struct MemoryRepositories {
    catalogue: RwLock<Catalogue>,
    analytics: DashMap<Uuid, AnalyticsCell>,
    views: DashMap<Uuid, Vec<PostViewRecord>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the post's mutex out of the map so no map guard is held across
    /// an await point.
    fn analytics_cell(&self, post_id: Uuid) -> Option<AnalyticsCell> {
        self.analytics.get(&post_id).map(|cell| Arc::clone(cell.value()))
    }

    /// The cell can be swapped out by a concurrent delete between lookup and
    /// lock; callers re-check after acquiring it.
    fn is_current(&self, post_id: Uuid, cell: &AnalyticsCell) -> bool {
        self.analytics
            .get(&post_id)
            .is_some_and(|current| Arc::ptr_eq(current.value(), cell))
    }

    async fn update_locked<F>(
        &self,
        post_id: Uuid,
        apply: F,
    ) -> Result<PostAnalyticsRecord, RepoError>
    where
        F: FnOnce(&mut PostAnalyticsRecord) + Send,
    {
        let cell = self.analytics_cell(post_id).ok_or(RepoError::NotFound)?;
        let mut record = cell.lock().await;
        if !self.is_current(post_id, &cell) {
            return Err(RepoError::NotFound);
        }
        apply(&mut *record);
        Ok(record.clone())
    }
}

#[async_trait]
impl CategoriesRepo for MemoryRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let catalogue = self.catalogue.read().await;
        let mut categories: Vec<_> = catalogue.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self.catalogue.read().await.categories.get(&id).cloned())
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        let catalogue = self.catalogue.read().await;
        Ok(catalogue
            .categories
            .values()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn count_posts_in_category(&self, id: Uuid) -> Result<u64, RepoError> {
        let catalogue = self.catalogue.read().await;
        let subtree = catalogue.category_subtree(id);
        Ok(catalogue
            .posts
            .values()
            .filter(|post| subtree.contains(&post.category_id))
            .count() as u64)
    }
}

#[async_trait]
impl CategoriesWriteRepo for MemoryRepositories {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut catalogue = self.catalogue.write().await;
        catalogue.ensure_category_unique(&params.name, &params.slug)?;
        if let Some(parent_id) = params.parent_id {
            catalogue.ensure_category_exists(parent_id)?;
        }

        let record = CategoryRecord {
            id: Uuid::new_v4(),
            parent_id: params.parent_id,
            name: params.name,
            title: params.title,
            description: params.description,
            thumbnail: params.thumbnail,
            slug: params.slug,
        };
        catalogue.categories.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError> {
        let mut catalogue = self.catalogue.write().await;
        if !catalogue.categories.contains_key(&id) {
            return Err(RepoError::NotFound);
        }

        let subtree = catalogue.category_subtree(id);
        if catalogue
            .posts
            .values()
            .any(|post| subtree.contains(&post.category_id))
        {
            return Err(RepoError::integrity(
                "category is still referenced by posts",
            ));
        }

        catalogue.categories.retain(|id, _| !subtree.contains(id));
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for MemoryRepositories {
    async fn list_posts(&self, scope: PostListScope) -> Result<Vec<PostRecord>, RepoError> {
        let catalogue = self.catalogue.read().await;
        let mut posts: Vec<_> = catalogue
            .posts
            .values()
            .filter(|post| scope.admits(post.status))
            .cloned()
            .collect();

        posts.sort_by(|a, b| {
            let newest_first = b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id));
            match scope {
                PostListScope::Public => newest_first,
                PostListScope::Admin => a
                    .is_published()
                    .cmp(&b.is_published())
                    .then(newest_first),
            }
        });
        Ok(posts)
    }

    async fn find_by_slug(
        &self,
        scope: PostListScope,
        slug: &str,
    ) -> Result<Option<PostRecord>, RepoError> {
        let catalogue = self.catalogue.read().await;
        Ok(catalogue
            .posts
            .values()
            .find(|post| post.slug == slug && scope.admits(post.status))
            .cloned())
    }

    async fn list_headings(&self, post_id: Uuid) -> Result<Vec<HeadingRecord>, RepoError> {
        let catalogue = self.catalogue.read().await;
        let mut headings: Vec<_> = catalogue
            .headings
            .values()
            .filter(|heading| heading.post_id == post_id)
            .cloned()
            .collect();
        headings.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.text.cmp(&b.text)));
        Ok(headings)
    }

    async fn count_views(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        Ok(post_ids
            .iter()
            .filter_map(|id| {
                self.views
                    .get(id)
                    .filter(|views| !views.is_empty())
                    .map(|views| (*id, views.len() as u64))
            })
            .collect())
    }

    async fn list_views(&self, post_id: Uuid) -> Result<Vec<PostViewRecord>, RepoError> {
        let mut views = self
            .views
            .get(&post_id)
            .map(|views| views.value().clone())
            .unwrap_or_default();
        views.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        Ok(views)
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut catalogue = self.catalogue.write().await;
        if catalogue.posts.values().any(|post| post.slug == params.slug) {
            return Err(RepoError::duplicate("posts_slug_key"));
        }
        catalogue.ensure_category_exists(params.category_id)?;

        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            description: params.description,
            content: params.content,
            thumbnail: params.thumbnail,
            keywords: params.keywords,
            slug: params.slug,
            category_id: params.category_id,
            status: params.status,
            created_at: now,
            updated_at: now,
        };
        catalogue.posts.insert(record.id, record.clone());
        self.analytics.insert(
            record.id,
            Arc::new(Mutex::new(PostAnalyticsRecord::zeroed(record.id))),
        );
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut catalogue = self.catalogue.write().await;
        catalogue.ensure_category_exists(params.category_id)?;
        let post = catalogue
            .posts
            .get_mut(&params.id)
            .ok_or(RepoError::NotFound)?;

        post.title = params.title;
        post.description = params.description;
        post.content = params.content;
        post.thumbnail = params.thumbnail;
        post.keywords = params.keywords;
        post.category_id = params.category_id;
        post.status = params.status;
        post.updated_at = OffsetDateTime::now_utc().max(post.updated_at);
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        // Hold the post's analytics lock so no counter update lands after removal.
        let cell = self.analytics_cell(id);
        let _guard = match cell.as_ref() {
            Some(cell) => Some(cell.lock().await),
            None => None,
        };

        let mut catalogue = self.catalogue.write().await;
        if catalogue.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        catalogue.headings.retain(|_, heading| heading.post_id != id);
        self.views.remove(&id);
        self.analytics.remove(&id);
        Ok(())
    }

    async fn create_heading(
        &self,
        params: CreateHeadingParams,
    ) -> Result<HeadingRecord, RepoError> {
        let mut catalogue = self.catalogue.write().await;
        if !catalogue.posts.contains_key(&params.post_id) {
            return Err(RepoError::InvalidInput {
                message: format!("post `{}` does not exist", params.post_id),
            });
        }
        if params.order < 0 {
            return Err(RepoError::InvalidInput {
                message: "heading order must not be negative".to_string(),
            });
        }
        if catalogue
            .headings
            .values()
            .any(|heading| heading.slug == params.slug)
        {
            return Err(RepoError::duplicate("headings_slug_key"));
        }

        let record = HeadingRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            text: params.text,
            slug: params.slug,
            level: params.level,
            order: params.order,
        };
        catalogue.headings.insert(record.id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl AnalyticsRepo for MemoryRepositories {
    async fn find_analytics(
        &self,
        post_id: Uuid,
    ) -> Result<Option<PostAnalyticsRecord>, RepoError> {
        match self.analytics_cell(post_id) {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn get_or_create_analytics(
        &self,
        post_id: Uuid,
    ) -> Result<PostAnalyticsRecord, RepoError> {
        if let Some(cell) = self.analytics_cell(post_id) {
            return Ok(cell.lock().await.clone());
        }

        let catalogue = self.catalogue.read().await;
        if !catalogue.posts.contains_key(&post_id) {
            return Err(RepoError::InvalidInput {
                message: format!("post `{post_id}` does not exist"),
            });
        }
        let cell = self
            .analytics
            .entry(post_id)
            .or_insert_with(|| Arc::new(Mutex::new(PostAnalyticsRecord::zeroed(post_id))))
            .value()
            .clone();
        drop(catalogue);

        Ok(cell.lock().await.clone())
    }

    async fn has_view(&self, post_id: Uuid, ip_address: &str) -> Result<bool, RepoError> {
        Ok(self.views.get(&post_id).is_some_and(|views| {
            views.iter().any(|view| view.ip_address == ip_address)
        }))
    }

    async fn record_view(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<ViewOutcome, RepoError> {
        let cell = self.analytics_cell(post_id).ok_or(RepoError::NotFound)?;
        let mut record = cell.lock().await;
        if !self.is_current(post_id, &cell) {
            return Err(RepoError::NotFound);
        }

        {
            let mut views = self.views.entry(post_id).or_default();
            if views.iter().any(|view| view.ip_address == ip_address) {
                return Ok(ViewOutcome::Duplicate);
            }
            views.push(PostViewRecord {
                id: Uuid::new_v4(),
                post_id,
                ip_address: ip_address.to_string(),
                timestamp: OffsetDateTime::now_utc(),
            });
        }

        record.record_view();
        Ok(ViewOutcome::Recorded(record.clone()))
    }

    async fn increment_clicks(&self, post_id: Uuid) -> Result<PostAnalyticsRecord, RepoError> {
        self.update_locked(post_id, PostAnalyticsRecord::record_click)
            .await
    }

    async fn increment_impressions(
        &self,
        post_id: Uuid,
    ) -> Result<PostAnalyticsRecord, RepoError> {
        self.update_locked(post_id, PostAnalyticsRecord::record_impression)
            .await
    }
}

#[async_trait]
impl HealthRepo for MemoryRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PostStatus;

    async fn seed(repo: &MemoryRepositories) -> (CategoryRecord, PostRecord) {
        let category = repo
            .create_category(CreateCategoryParams {
                parent_id: None,
                name: "Rust".to_string(),
                title: None,
                description: None,
                thumbnail: None,
                slug: "rust".to_string(),
            })
            .await
            .expect("category");
        let post = repo
            .create_post(CreatePostParams {
                title: "Ownership".to_string(),
                description: String::new(),
                content: "body".to_string(),
                thumbnail: None,
                keywords: String::new(),
                slug: "ownership".to_string(),
                category_id: category.id,
                status: PostStatus::Published,
            })
            .await
            .expect("post");
        (category, post)
    }

    #[tokio::test]
    async fn create_post_seeds_zeroed_analytics() {
        let repo = MemoryRepositories::new();
        let (_, post) = seed(&repo).await;

        let analytics = repo
            .find_analytics(post.id)
            .await
            .expect("lookup")
            .expect("analytics row");
        assert_eq!(analytics.views, 0);
        assert_eq!(analytics.click_through_rate, 0.0);
    }

    #[tokio::test]
    async fn duplicate_slugs_are_rejected() {
        let repo = MemoryRepositories::new();
        let (category, _) = seed(&repo).await;

        let err = repo
            .create_post(CreatePostParams {
                title: "Again".to_string(),
                description: String::new(),
                content: "body".to_string(),
                thumbnail: None,
                keywords: String::new(),
                slug: "ownership".to_string(),
                category_id: category.id,
                status: PostStatus::Draft,
            })
            .await
            .expect_err("duplicate slug");
        assert!(matches!(err, RepoError::Duplicate { constraint } if constraint == "posts_slug_key"));
    }

    #[tokio::test]
    async fn category_with_posts_cannot_be_deleted() {
        let repo = MemoryRepositories::new();
        let (category, _) = seed(&repo).await;

        let err = repo
            .delete_category(category.id)
            .await
            .expect_err("category in use");
        assert!(matches!(err, RepoError::Integrity { .. }));
    }

    #[tokio::test]
    async fn deleting_a_post_cascades_to_views_and_analytics() {
        let repo = MemoryRepositories::new();
        let (_, post) = seed(&repo).await;
        repo.record_view(post.id, "10.0.0.1").await.expect("view");

        repo.delete_post(post.id).await.expect("delete");

        assert!(repo.find_analytics(post.id).await.expect("lookup").is_none());
        assert!(!repo.has_view(post.id, "10.0.0.1").await.expect("has view"));
        assert!(matches!(
            repo.increment_clicks(post.id).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn record_view_rechecks_under_lock() {
        let repo = MemoryRepositories::new();
        let (_, post) = seed(&repo).await;

        let first = repo.record_view(post.id, "10.0.0.1").await.expect("first");
        let second = repo.record_view(post.id, "10.0.0.1").await.expect("second");

        assert!(first.is_recorded());
        assert_eq!(second, ViewOutcome::Duplicate);
        assert_eq!(repo.list_views(post.id).await.expect("views").len(), 1);
    }
}
