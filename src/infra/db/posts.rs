use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateHeadingParams, CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::{HeadingRecord, PostRecord, PostViewRecord};

use super::PostgresRepositories;
use super::types::{
    HEADING_COLUMNS, HeadingRow, POST_COLUMNS, PostRow, PostViewRow, VIEW_COLUMNS,
};
use super::util::{convert_count, map_sqlx_error};

impl PostgresRepositories {
    fn scope_clause(scope: PostListScope) -> (&'static str, &'static str) {
        match scope {
            PostListScope::Public => (
                "WHERE status = 'published'::post_status",
                "ORDER BY created_at DESC, id",
            ),
            PostListScope::Admin => ("WHERE TRUE", "ORDER BY status, created_at DESC, id"),
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self, scope: PostListScope) -> Result<Vec<PostRecord>, RepoError> {
        let (filter, order) = Self::scope_clause(scope);
        let sql = format!("SELECT {POST_COLUMNS} FROM posts {filter} {order}");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_slug(
        &self,
        scope: PostListScope,
        slug: &str,
    ) -> Result<Option<PostRecord>, RepoError> {
        let (filter, _) = Self::scope_clause(scope);
        let sql = format!("SELECT {POST_COLUMNS} FROM posts {filter} AND slug = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn list_headings(&self, post_id: Uuid) -> Result<Vec<HeadingRecord>, RepoError> {
        let sql = format!(
            "SELECT {HEADING_COLUMNS} FROM headings WHERE post_id = $1 ORDER BY sort_order, text"
        );
        let rows = sqlx::query_as::<_, HeadingRow>(&sql)
            .bind(post_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(HeadingRecord::try_from).collect()
    }

    async fn count_views(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT post_id, COUNT(*) FROM post_views WHERE post_id = ANY($1) GROUP BY post_id",
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|(post_id, count)| Ok((post_id, convert_count(count)?)))
            .collect()
    }

    async fn list_views(&self, post_id: Uuid) -> Result<Vec<PostViewRecord>, RepoError> {
        let sql = format!(
            "SELECT {VIEW_COLUMNS} FROM post_views WHERE post_id = $1 \
             ORDER BY \"timestamp\" DESC, id"
        );
        let rows = sqlx::query_as::<_, PostViewRow>(&sql)
            .bind(post_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostViewRecord::from).collect())
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            title,
            description,
            content,
            thumbnail,
            keywords,
            slug,
            category_id,
            status,
        } = params;
        let now = OffsetDateTime::now_utc();

        let mut tx = self.begin().await?;

        let sql = format!(
            "INSERT INTO posts (id, title, description, content, thumbnail, keywords, slug, \
             category_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(title)
            .bind(description)
            .bind(content)
            .bind(thumbnail)
            .bind(keywords)
            .bind(slug)
            .bind(category_id)
            .bind(status)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("INSERT INTO post_analytics (id, post_id) VALUES ($1, $2)")
            .bind(Uuid::new_v4())
            .bind(row.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            title,
            description,
            content,
            thumbnail,
            keywords,
            category_id,
            status,
        } = params;

        let sql = format!(
            "UPDATE posts SET title = $2, description = $3, content = $4, thumbnail = $5, \
             keywords = $6, category_id = $7, status = $8, updated_at = $9 \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(title)
            .bind(description)
            .bind(content)
            .bind(thumbnail)
            .bind(keywords)
            .bind(category_id)
            .bind(status)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn create_heading(
        &self,
        params: CreateHeadingParams,
    ) -> Result<HeadingRecord, RepoError> {
        let sql = format!(
            "INSERT INTO headings (id, post_id, text, slug, level, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {HEADING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, HeadingRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.post_id)
            .bind(params.text)
            .bind(params.slug)
            .bind(params.level.get())
            .bind(params.order)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        HeadingRecord::try_from(row)
    }
}
