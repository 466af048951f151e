use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AnalyticsRepo, RepoError, ViewOutcome};
use crate::domain::entities::PostAnalyticsRecord;

use super::PostgresRepositories;
use super::types::{ANALYTICS_COLUMNS, PostAnalyticsRow};
use super::util::map_sqlx_error;

impl PostgresRepositories {
    /// Fetch the analytics row and hold its row lock until `tx` ends.
    async fn lock_analytics(
        tx: &mut Transaction<'_, Postgres>,
        post_id: Uuid,
    ) -> Result<PostAnalyticsRecord, RepoError> {
        let sql =
            format!("SELECT {ANALYTICS_COLUMNS} FROM post_analytics WHERE post_id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, PostAnalyticsRow>(&sql)
            .bind(post_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostAnalyticsRecord::from)
            .ok_or(RepoError::NotFound)
    }

    async fn store_counters(
        tx: &mut Transaction<'_, Postgres>,
        record: &PostAnalyticsRecord,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE post_analytics \
             SET views = $2, impressions = $3, clicks = $4, click_through_rate = $5 \
             WHERE id = $1",
        )
        .bind(record.id)
        .bind(record.views)
        .bind(record.impressions)
        .bind(record.clicks)
        .bind(record.click_through_rate)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_locked<F>(
        &self,
        post_id: Uuid,
        apply: F,
    ) -> Result<PostAnalyticsRecord, RepoError>
    where
        F: FnOnce(&mut PostAnalyticsRecord) + Send,
    {
        let mut tx = self.begin().await?;
        let mut record = Self::lock_analytics(&mut tx, post_id).await?;
        apply(&mut record);
        Self::store_counters(&mut tx, &record).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(record)
    }
}

#[async_trait]
impl AnalyticsRepo for PostgresRepositories {
    async fn find_analytics(
        &self,
        post_id: Uuid,
    ) -> Result<Option<PostAnalyticsRecord>, RepoError> {
        let sql = format!("SELECT {ANALYTICS_COLUMNS} FROM post_analytics WHERE post_id = $1");
        let row = sqlx::query_as::<_, PostAnalyticsRow>(&sql)
            .bind(post_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostAnalyticsRecord::from))
    }

    async fn get_or_create_analytics(
        &self,
        post_id: Uuid,
    ) -> Result<PostAnalyticsRecord, RepoError> {
        sqlx::query(
            "INSERT INTO post_analytics (id, post_id) VALUES ($1, $2) \
             ON CONFLICT (post_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.find_analytics(post_id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn has_view(&self, post_id: Uuid, ip_address: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM post_views WHERE post_id = $1 AND ip_address = $2)",
        )
        .bind(post_id)
        .bind(ip_address)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn record_view(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<ViewOutcome, RepoError> {
        let mut tx = self.begin().await?;
        let mut record = Self::lock_analytics(&mut tx, post_id).await?;

        let seen: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM post_views WHERE post_id = $1 AND ip_address = $2)",
        )
        .bind(post_id)
        .bind(ip_address)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if seen {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(ViewOutcome::Duplicate);
        }

        sqlx::query(
            "INSERT INTO post_views (id, post_id, ip_address, \"timestamp\") \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(ip_address)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        record.record_view();
        Self::store_counters(&mut tx, &record).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(ViewOutcome::Recorded(record))
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
