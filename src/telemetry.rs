//! `tracing` setup for the chart pipeline.
//!
//! Warnings cover what a chart viewer would notice: `dataset path failed,
//! falling back`, `advisory raised` (carrying `resource` and `message`) and
//! `dropping unjoinable record` (carrying `key` and `missing_from`). Row
//! rejections, duplicate states and `discarding stale pipeline result` are
//! logged at debug with the `chart` and `generation` fields where they apply.
//! Hosts either call `init_default_tracing` or install their own subscriber.

/// Installs a compact `tracing` subscriber when the `telemetry` feature is enabled.
///
/// The filter comes from `RUST_LOG` and defaults to `insurance_charts=info`.
/// Returns `false` when the feature is disabled or a global subscriber is
/// already installed.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("insurance_charts=info")),
            )
            .with_target(true)
            .compact();

        return builder.try_init().is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
