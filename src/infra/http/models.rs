//! Wire projections and request bodies.
//!
//! Projections are pure field selections over domain records; nothing here
//! validates.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::blog::{PostDetail, PostSummary};
use crate::application::content::{
    CreateCategoryCommand, CreateHeadingCommand, CreatePostCommand, PostAnalyticsReport,
    UpdatePostCommand,
};
use crate::domain::entities::{
    CategoryRecord, HeadingRecord, PostAnalyticsRecord, PostRecord, PostViewRecord,
};
use crate::domain::types::{HeadingLevel, PostStatus};

pub const CLICKS_INCREMENTED_MESSAGE: &str = "Post clicks incremented successfully.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummaryView {
    pub name: String,
    pub slug: String,
}

impl From<&CategoryRecord> for CategorySummaryView {
    fn from(category: &CategoryRecord) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryView {
    pub id: Uuid,
    #[serde(rename = "parent")]
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub slug: String,
}

impl From<CategoryRecord> for CategoryView {
    fn from(category: CategoryRecord) -> Self {
        Self {
            id: category.id,
            parent_id: category.parent_id,
            name: category.name,
            title: category.title,
            description: category.description,
            thumbnail: category.thumbnail,
            slug: category.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadingView {
    pub text: String,
    pub slug: String,
    pub level: HeadingLevel,
    pub order: i32,
}

impl From<HeadingRecord> for HeadingView {
    fn from(heading: HeadingRecord) -> Self {
        Self {
            text: heading.text,
            slug: heading.slug,
            level: heading.level,
            order: heading.order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostListItemView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub slug: String,
    pub category: CategorySummaryView,
    pub view_count: u64,
}

impl From<PostSummary> for PostListItemView {
    fn from(summary: PostSummary) -> Self {
        let PostSummary {
            post,
            category,
            view_count,
        } = summary;
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            thumbnail: post.thumbnail,
            slug: post.slug,
            category: CategorySummaryView::from(&category),
            view_count,
        }
    }
}

/// Admin listing row: the public list projection plus the post status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminPostListItemView {
    #[serde(flatten)]
    pub item: PostListItemView,
    pub status: PostStatus,
}

impl From<PostSummary> for AdminPostListItemView {
    fn from(summary: PostSummary) -> Self {
        let status = summary.post.status;
        Self {
            item: PostListItemView::from(summary),
            status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostDetailView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub keywords: String,
    pub slug: String,
    pub category: CategoryView,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub headings: Vec<HeadingView>,
    pub view_count: u64,
}

impl From<PostDetail> for PostDetailView {
    fn from(detail: PostDetail) -> Self {
        let PostDetail {
            post,
            category,
            headings,
            view_count,
        } = detail;
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            content: post.content,
            thumbnail: post.thumbnail,
            keywords: post.keywords,
            slug: post.slug,
            category: CategoryView::from(category),
            status: post.status,
            created_at: post.created_at,
            updated_at: post.updated_at,
            headings: headings.into_iter().map(HeadingView::from).collect(),
            view_count,
        }
    }
}

/// Bare post row returned by admin writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostRecordView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub keywords: String,
    pub slug: String,
    pub category_id: Uuid,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PostRecord> for PostRecordView {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            content: post.content,
            thumbnail: post.thumbnail,
            keywords: post.keywords,
            slug: post.slug,
            category_id: post.category_id,
            status: post.status,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostViewItem {
    pub id: Uuid,
    pub post_id: Uuid,
    pub ip_address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<PostViewRecord> for PostViewItem {
    fn from(view: PostViewRecord) -> Self {
        Self {
            id: view.id,
            post_id: view.post_id,
            ip_address: view.ip_address,
            timestamp: view.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostAnalyticsView {
    pub post_slug: String,
    pub post_title: String,
    pub views: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub click_through_rate: f64,
    pub avg_time_on_page: f64,
}

impl From<PostAnalyticsReport> for PostAnalyticsView {
    fn from(report: PostAnalyticsReport) -> Self {
        let PostAnalyticsReport { post, analytics } = report;
        Self {
            post_slug: post.slug,
            post_title: post.title,
            views: analytics.views,
            impressions: analytics.impressions,
            clicks: analytics.clicks,
            click_through_rate: analytics.click_through_rate,
            avg_time_on_page: analytics.avg_time_on_page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClickResponse {
    pub message: String,
    pub clicks: i64,
}

impl From<PostAnalyticsRecord> for ClickResponse {
    fn from(analytics: PostAnalyticsRecord) -> Self {
        Self {
            message: CLICKS_INCREMENTED_MESSAGE.to_string(),
            clicks: analytics.clicks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpressionResponse {
    pub impressions: i64,
    pub click_through_rate: f64,
}

impl From<PostAnalyticsRecord> for ImpressionResponse {
    fn from(analytics: PostAnalyticsRecord) -> Self {
        Self {
            impressions: analytics.impressions,
            click_through_rate: analytics.click_through_rate,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

impl From<CreateCategoryRequest> for CreateCategoryCommand {
    fn from(request: CreateCategoryRequest) -> Self {
        Self {
            name: request.name,
            title: request.title,
            description: request.description,
            thumbnail: request.thumbnail,
            slug: request.slug,
            parent: request.parent,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub category: String,
    #[serde(default)]
    pub status: PostStatus,
}

impl From<CreatePostRequest> for CreatePostCommand {
    fn from(request: CreatePostRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            content: request.content,
            thumbnail: request.thumbnail,
            keywords: request.keywords,
            slug: request.slug,
            category: request.category,
            status: request.status,
        }
    }
}

/// Absent fields keep their stored value; `"thumbnail": null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub thumbnail: Option<Option<String>>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<PostStatus>,
}

impl From<UpdatePostRequest> for UpdatePostCommand {
    fn from(request: UpdatePostRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            content: request.content,
            thumbnail: request.thumbnail,
            keywords: request.keywords,
            category: request.category,
            status: request.status,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHeadingRequest {
    pub text: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub level: i16,
    #[serde(default)]
    pub order: i32,
}

impl From<CreateHeadingRequest> for CreateHeadingCommand {
    fn from(request: CreateHeadingRequest) -> Self {
        Self {
            text: request.text,
            slug: request.slug,
            level: request.level,
            order: request.order,
        }
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn category() -> CategoryRecord {
        CategoryRecord {
            id: Uuid::nil(),
            parent_id: None,
            name: "tech".into(),
            title: Some("Technology".into()),
            description: None,
            thumbnail: None,
            slug: "tech".into(),
        }
    }

    fn post() -> PostRecord {
        PostRecord {
            id: Uuid::nil(),
            title: "Hello".into(),
            description: "greeting".into(),
            content: "<p>hi</p>".into(),
            thumbnail: None,
            keywords: "hello".into(),
            slug: "hello".into(),
            category_id: Uuid::nil(),
            status: PostStatus::Published,
            created_at: datetime!(2025-03-01 12:00 UTC),
            updated_at: datetime!(2025-03-02 08:30 UTC),
        }
    }

    #[test]
    fn list_item_carries_category_name_and_slug_only() {
        let item = PostListItemView::from(PostSummary {
            post: post(),
            category: category(),
            view_count: 4,
        });
        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["category"], json!({"name": "tech", "slug": "tech"}));
        assert_eq!(value["view_count"], json!(4));
        assert!(value.get("content").is_none());
    }

    #[test]
    fn admin_list_item_flattens_status() {
        let item = AdminPostListItemView::from(PostSummary {
            post: post(),
            category: category(),
            view_count: 0,
        });
        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["status"], json!("published"));
        assert_eq!(value["slug"], json!("hello"));
    }

    #[test]
    fn detail_uses_rfc3339_timestamps_and_projects_headings() {
        let heading = HeadingRecord {
            id: Uuid::nil(),
            post_id: Uuid::nil(),
            text: "Intro".into(),
            slug: "intro".into(),
            level: HeadingLevel::new(2).expect("level"),
            order: 0,
        };
        let detail = PostDetailView::from(PostDetail {
            post: post(),
            category: category(),
            headings: vec![heading],
            view_count: 1,
        });
        let value = serde_json::to_value(&detail).expect("serialize");
        assert_eq!(value["created_at"], json!("2025-03-01T12:00:00Z"));
        assert_eq!(
            value["headings"],
            json!([{"text": "Intro", "slug": "intro", "level": 2, "order": 0}])
        );
        assert_eq!(value["category"]["title"], json!("Technology"));
    }

    #[test]
    fn category_view_names_parent_reference_parent() {
        let parent_id = Uuid::from_u128(7);
        let value = serde_json::to_value(CategoryView::from(CategoryRecord {
            parent_id: Some(parent_id),
            ..category()
        }))
        .expect("serialize");
        assert_eq!(value["parent"], json!(parent_id));
        assert!(value.get("parent_id").is_none());
    }

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let cleared: UpdatePostRequest =
            serde_json::from_value(json!({"thumbnail": null})).expect("deserialize");
        assert_eq!(cleared.thumbnail, Some(None));

        let untouched: UpdatePostRequest =
            serde_json::from_value(json!({"title": "New"})).expect("deserialize");
        assert_eq!(untouched.thumbnail, None);
        assert_eq!(untouched.title.as_deref(), Some("New"));
    }
}
