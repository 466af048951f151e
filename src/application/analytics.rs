//! Engagement counter service: views, clicks and impressions.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{AnalyticsRepo, RepoError, ViewOutcome};
use crate::domain::entities::PostAnalyticsRecord;

pub(crate) const VIEWS_RECORDED_METRIC: &str = "lectern_post_views_recorded_total";
pub(crate) const VIEWS_DUPLICATE_METRIC: &str = "lectern_post_views_duplicate_total";
pub(crate) const CLICKS_METRIC: &str = "lectern_post_clicks_total";
pub(crate) const IMPRESSIONS_METRIC: &str = "lectern_post_impressions_total";

#[derive(Clone)]
pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepo>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepo>) -> Self {
        Self { repo }
    }

    /// Count a view of `post_id` from `ip_address` at most once, ever.
    ///
    /// The address is compared verbatim; `::ffff:1.2.3.4` and `1.2.3.4` are
    /// distinct origins.
    pub async fn increment_view(
        &self,
        post_id: Uuid,
        ip_address: &str,
    ) -> Result<ViewOutcome, RepoError> {
        let outcome = if self.repo.has_view(post_id, ip_address).await? {
            ViewOutcome::Duplicate
        } else {
            self.repo.record_view(post_id, ip_address).await?
        };

        match &outcome {
            ViewOutcome::Recorded(analytics) => {
                counter!(VIEWS_RECORDED_METRIC).increment(1);
                debug!(
                    target = "lectern::analytics",
                    post_id = %post_id,
                    views = analytics.views,
                    "view recorded"
                );
            }
            ViewOutcome::Duplicate => {
                counter!(VIEWS_DUPLICATE_METRIC).increment(1);
                debug!(
                    target = "lectern::analytics",
                    post_id = %post_id,
                    "duplicate view suppressed"
                );
            }
        }

        Ok(outcome)
    }

    /// Every call counts; there is no per-origin deduplication for clicks.
    pub async fn increment_click(&self, post_id: Uuid) -> Result<PostAnalyticsRecord, RepoError> {
        self.repo.get_or_create_analytics(post_id).await?;
        let analytics = self.repo.increment_clicks(post_id).await?;
        counter!(CLICKS_METRIC).increment(1);
        debug!(
            target = "lectern::analytics",
            post_id = %post_id,
            clicks = analytics.clicks,
            click_through_rate = analytics.click_through_rate,
            "click recorded"
        );
        Ok(analytics)
    }

    pub async fn increment_impression(
        &self,
        post_id: Uuid,
    ) -> Result<PostAnalyticsRecord, RepoError> {
        self.repo.get_or_create_analytics(post_id).await?;
        let analytics = self.repo.increment_impressions(post_id).await?;
        counter!(IMPRESSIONS_METRIC).increment(1);
        debug!(
            target = "lectern::analytics",
            post_id = %post_id,
            impressions = analytics.impressions,
            click_through_rate = analytics.click_through_rate,
            "impression recorded"
        );
        Ok(analytics)
    }

    pub async fn analytics_for(&self, post_id: Uuid) -> Result<PostAnalyticsRecord, RepoError> {
        self.repo
            .find_analytics(post_id)
            .await?
            .ok_or(RepoError::NotFound)
    }
}
