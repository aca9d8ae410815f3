use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use tracing::level_filters::LevelFilter;

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = env_filter(logging);

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

/// Build the env filter for the configured level. `LogLevel` converts to a
/// `LevelFilter` first; a filter directive is built from that.
fn env_filter(logging: &LoggingSettings) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from(logging.level).into())
        .from_env_lossy()
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "risalto_ranked_cache_hit_total",
            Unit::Count,
            "Total number of ranked-query cache hits."
        );
        describe_counter!(
            "risalto_ranked_cache_miss_total",
            Unit::Count,
            "Total number of ranked-query cache misses."
        );
        describe_counter!(
            "risalto_ranked_cache_store_total",
            Unit::Count,
            "Total number of ranked-query cache writes."
        );
        describe_counter!(
            "risalto_ranked_cache_flight_shared_total",
            Unit::Count,
            "Total number of callers served by another caller's in-flight computation."
        );
        describe_counter!(
            "risalto_like_toggle_total",
            Unit::Count,
            "Total number of like/unlike toggles applied."
        );
        describe_counter!(
            "risalto_view_record_total",
            Unit::Count,
            "Total number of view increments applied."
        );
        describe_histogram!(
            "risalto_ranked_compute_ms",
            Unit::Milliseconds,
            "Ranked-query aggregation latency in milliseconds."
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn configured_level_becomes_the_default_directive() {
        // The chain is LogLevel -> LevelFilter -> Directive; LogLevel has no
        // direct Directive conversion.
        let directive: tracing_subscriber::filter::Directive =
            LevelFilter::from(LogLevel::Debug).into();
        assert_eq!(directive.to_string(), "debug");
    }

    #[test]
    fn every_level_builds_a_filter() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            let logging = LoggingSettings {
                level,
                format: LogFormat::Json,
            };
            let _ = env_filter(&logging);
        }
    }
}
