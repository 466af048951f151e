use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::analytics::{
    CLICKS_METRIC, IMPRESSIONS_METRIC, VIEWS_DUPLICATE_METRIC, VIEWS_RECORDED_METRIC,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            VIEWS_RECORDED_METRIC,
            Unit::Count,
            "Post views counted from a new (post, ip) origin."
        );
        describe_counter!(
            VIEWS_DUPLICATE_METRIC,
            Unit::Count,
            "Post views suppressed because the origin was already counted."
        );
        describe_counter!(CLICKS_METRIC, Unit::Count, "Post clicks recorded.");
        describe_counter!(
            IMPRESSIONS_METRIC,
            Unit::Count,
            "Post impressions recorded."
        );
    });
}
