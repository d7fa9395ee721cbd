use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
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
            "voce_featured_live_total",
            Unit::Count,
            "Featured feeds served straight from live store results."
        );
        describe_counter!(
            "voce_featured_fallback_total",
            Unit::Count,
            "Featured feed requests that fell back to snapshot reconciliation."
        );
        describe_counter!(
            "voce_snapshot_read_total",
            Unit::Count,
            "Snapshot file reads, labeled by key and result."
        );
        describe_counter!(
            "voce_snapshot_write_total",
            Unit::Count,
            "Snapshot file writes, labeled by key and result."
        );
        describe_counter!(
            "voce_snapshot_corrupt_total",
            Unit::Count,
            "Snapshot payloads that failed to decode and were replaced by an empty default."
        );
    });
}
