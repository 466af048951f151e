use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::entities::{
    CategoryRecord, HeadingRecord, PostAnalyticsRecord, PostRecord, PostViewRecord,
};
use crate::domain::types::{HeadingLevel, PostStatus};

pub(crate) const CATEGORY_COLUMNS: &str =
    "id, parent_id, name, title, description, thumbnail, slug";
pub(crate) const POST_COLUMNS: &str = "id, title, description, content, thumbnail, keywords, \
     slug, category_id, status, created_at, updated_at";
pub(crate) const HEADING_COLUMNS: &str = "id, post_id, text, slug, level, sort_order";
pub(crate) const VIEW_COLUMNS: &str = "id, post_id, ip_address, \"timestamp\"";
pub(crate) const ANALYTICS_COLUMNS: &str =
    "id, post_id, views, impressions, clicks, click_through_rate, avg_time_on_page";

#[derive(sqlx::FromRow)]
pub(crate) struct CategoryRow {
    pub(crate) id: Uuid,
    pub(crate) parent_id: Option<Uuid>,
    pub(crate) name: String,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) thumbnail: Option<String>,
    pub(crate) slug: String,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
            title: row.title,
            description: row.description,
            thumbnail: row.thumbnail,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) content: String,
    pub(crate) thumbnail: Option<String>,
    pub(crate) keywords: String,
    pub(crate) slug: String,
    pub(crate) category_id: Uuid,
    pub(crate) status: PostStatus,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            content: row.content,
            thumbnail: row.thumbnail,
            keywords: row.keywords,
            slug: row.slug,
            category_id: row.category_id,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct HeadingRow {
    pub(crate) id: Uuid,
    pub(crate) post_id: Uuid,
    pub(crate) text: String,
    pub(crate) slug: String,
    pub(crate) level: i16,
    pub(crate) sort_order: i32,
}

impl TryFrom<HeadingRow> for HeadingRecord {
    type Error = RepoError;

    fn try_from(row: HeadingRow) -> Result<Self, Self::Error> {
        let level = HeadingLevel::new(row.level).map_err(|err| {
            RepoError::from_persistence(format!("heading `{}` is corrupt: {err}", row.slug))
        })?;
        Ok(Self {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            slug: row.slug,
            level,
            order: row.sort_order,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostViewRow {
    pub(crate) id: Uuid,
    pub(crate) post_id: Uuid,
    pub(crate) ip_address: String,
    pub(crate) timestamp: OffsetDateTime,
}

impl From<PostViewRow> for PostViewRecord {
    fn from(row: PostViewRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            ip_address: row.ip_address,
            timestamp: row.timestamp,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostAnalyticsRow {
    pub(crate) id: Uuid,
    pub(crate) post_id: Uuid,
    pub(crate) views: i64,
    pub(crate) impressions: i64,
    pub(crate) clicks: i64,
    pub(crate) click_through_rate: f64,
    pub(crate) avg_time_on_page: f64,
}

impl From<PostAnalyticsRow> for PostAnalyticsRecord {
    fn from(row: PostAnalyticsRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            views: row.views,
            impressions: row.impressions,
            clicks: row.clicks,
            click_through_rate: row.click_through_rate,
            avg_time_on_page: row.avg_time_on_page,
        }
    }
}
