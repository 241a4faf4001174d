//! Tracing setup.
//!
//! Library events go to stderr so they never mix with command output on
//! stdout. `RUST_LOG` wins, then `FIELDLINK_LOG_LEVEL`, then `warn`.

use std::io;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Fallback filter variable.
pub const LOG_LEVEL_ENV: &str = "FIELDLINK_LOG_LEVEL";

const DEFAULT_LEVEL: &str = "warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| DEFAULT_LEVEL.to_string());
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    })
}

/// Install the global subscriber. `json` switches to one JSON object per line.
pub fn init(json: bool) {
    let registry = tracing_subscriber::registry().with(filter());

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr),
            )
            .init();
    }
}
