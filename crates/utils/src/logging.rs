use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Environment variable selecting the maximum log level.
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Resolves the log level from an optional `LOG_LEVEL` value, falling back
/// to `TRACE` on debug builds and `INFO` otherwise.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    value.map_or(default, |level| {
        LevelFilter::from_str(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {default}");
            default
        })
    })
}

/// Installs the global subscriber, only events emitted by the relay crates
/// are printed.
///
/// Calling it more than once is a no-op.
pub fn init() {
    let level = level_from(std::env::var(LOG_LEVEL_VAR).ok().as_deref());

    let _ = tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("mailrelay")
                })),
        )
        .try_init();
}
