//! Domain entities mirrored from persistent storage.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{HeadingLevel, PostStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub keywords: String,
    pub slug: String,
    pub category_id: Uuid,
    pub status: PostStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PostRecord {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub slug: String,
    pub level: HeadingLevel,
    pub order: i32,
}

/// One distinct `(post, ip)` viewing event. Only used to suppress duplicate views.
#[derive(Debug, Clone, PartialEq)]
pub struct PostViewRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub ip_address: String,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostAnalyticsRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub views: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub click_through_rate: f64,
    pub avg_time_on_page: f64,
}
