use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::{
    application::render::{
        METRIC_RENDER_ATTEMPT_TOTAL, METRIC_RENDER_FALLBACK_TOTAL, METRIC_RENDER_MS,
        METRIC_RENDER_RETRY_TOTAL,
    },
    config::{LogFormat, LoggingSettings},
};

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
            METRIC_RENDER_ATTEMPT_TOTAL,
            Unit::Count,
            "Total number of calls made to the theme renderer."
        );
        describe_counter!(
            METRIC_RENDER_RETRY_TOTAL,
            Unit::Count,
            "Total number of renderer calls retried after a transient failure."
        );
        describe_counter!(
            METRIC_RENDER_FALLBACK_TOTAL,
            Unit::Count,
            "Total number of previews served from the fallback document."
        );
        describe_histogram!(
            METRIC_RENDER_MS,
            Unit::Milliseconds,
            "Render invocation latency in milliseconds, retries included."
        );
    });
}
