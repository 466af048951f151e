//! Counter arithmetic for per-post engagement analytics.
//!
//! Storage adapters load a [`PostAnalyticsRecord`] while holding the post's
//! exclusive lock, apply one of the mutations below and persist the result, so
//! the click-through-rate derivation lives in exactly one place.

use uuid::Uuid;

use super::entities::PostAnalyticsRecord;

impl PostAnalyticsRecord {
    /// Fresh analytics row created alongside a post: every counter at zero.
    pub fn zeroed(post_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            views: 0,
            impressions: 0,
            clicks: 0,
            click_through_rate: 0.0,
            avg_time_on_page: 0.0,
        }
    }

    pub fn record_view(&mut self) {
        self.views += 1;
    }

    pub fn record_click(&mut self) {
        self.clicks += 1;
        self.refresh_click_through_rate();
    }

    pub fn record_impression(&mut self) {
        self.impressions += 1;
        self.refresh_click_through_rate();
    }

    /// Recomputes the rate only when there is at least one impression; otherwise
    /// the previous value is kept.
    fn refresh_click_through_rate(&mut self) {
        if let Some(rate) = click_through_rate(self.clicks, self.impressions) {
            self.click_through_rate = rate;
        }
    }
}

/// `clicks / impressions * 100`, or `None` while there are no impressions.
pub fn click_through_rate(clicks: i64, impressions: i64) -> Option<f64> {
    (impressions > 0).then(|| (clicks as f64 / impressions as f64) * 100.0)
}
